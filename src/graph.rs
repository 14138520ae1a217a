//! Spatial adjacency between elements.
//!
//! The MRF term only needs adjacency lookup: for element `i`, which elements
//! are its neighbors. The graph is symmetric, free of self loops and fixed
//! once built.
//!
//! # Pseudocoloring
//!
//! A proper coloring assigns colors so that no two neighbors share one.
//! Elements of the same color are conditionally independent given the
//! other colors, so a color class can be redrawn in one block. The 1-D chain
//! is bipartite and gets the parity coloring `i mod 2`.

use crate::error::{Error, Result};
use petgraph::graph::{NodeIndex, UnGraph};

/// Immutable, symmetric neighbor relation over element indices.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    graph: UnGraph<(), ()>,
    adjacency: Vec<Vec<usize>>,
}

impl NeighborGraph {
    /// 1-D chain: element `i` neighbors `i - 1` and `i + 1` where they exist.
    pub fn chain(n: usize) -> Self {
        let adjacency = (0..n)
            .map(|i| {
                let mut nb = Vec::with_capacity(2);
                if i > 0 {
                    nb.push(i - 1);
                }
                if i + 1 < n {
                    nb.push(i + 1);
                }
                nb
            })
            .collect();
        Self::build(adjacency)
    }

    /// Build from an explicit adjacency list.
    ///
    /// Duplicate entries are dropped and each list is sorted. Out-of-range
    /// indices, self loops and one-directional edges are rejected.
    pub fn from_adjacency(mut adjacency: Vec<Vec<usize>>) -> Result<Self> {
        let n = adjacency.len();
        for (i, nb) in adjacency.iter_mut().enumerate() {
            nb.sort_unstable();
            nb.dedup();
            if let Some(&j) = nb.iter().find(|&&j| j >= n) {
                return Err(Error::NeighborOutOfRange {
                    element: i,
                    neighbor: j,
                    n_elements: n,
                });
            }
            if nb.binary_search(&i).is_ok() {
                return Err(Error::InvalidGraph(format!(
                    "element {i} lists itself as a neighbor"
                )));
            }
        }
        for (i, nb) in adjacency.iter().enumerate() {
            for &j in nb {
                if adjacency[j].binary_search(&i).is_err() {
                    return Err(Error::InvalidGraph(format!(
                        "edge {i} -> {j} has no reverse edge"
                    )));
                }
            }
        }
        Ok(Self::build(adjacency))
    }

    fn build(adjacency: Vec<Vec<usize>>) -> Self {
        let mut graph = UnGraph::<(), ()>::with_capacity(adjacency.len(), adjacency.len());
        for _ in 0..adjacency.len() {
            let _ = graph.add_node(());
        }
        for (i, nb) in adjacency.iter().enumerate() {
            for &j in nb.iter().filter(|&&j| j > i) {
                let _ = graph.add_edge(NodeIndex::new(i), NodeIndex::new(j), ());
            }
        }
        Self { graph, adjacency }
    }

    /// Neighbors of element `i`, ascending.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.adjacency[i]
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The underlying petgraph graph.
    pub fn as_graph(&self) -> &UnGraph<(), ()> {
        &self.graph
    }

    /// True when every edge has its reverse.
    pub fn is_symmetric(&self) -> bool {
        self.adjacency
            .iter()
            .enumerate()
            .all(|(i, nb)| nb.iter().all(|&j| self.adjacency[j].contains(&i)))
    }

    /// Greedy proper coloring in index order: each element takes the smallest
    /// color not used by an already-colored neighbor.
    pub fn pseudocolor(&self) -> Vec<usize> {
        let n = self.graph.node_count();
        let mut colors: Vec<Option<usize>> = vec![None; n];
        for i in 0..n {
            let used: Vec<usize> = self
                .graph
                .neighbors(NodeIndex::new(i))
                .filter_map(|nb| colors[nb.index()])
                .collect();
            let mut c = 0;
            while used.contains(&c) {
                c += 1;
            }
            colors[i] = Some(c);
        }
        colors.into_iter().map(|c| c.unwrap_or(0)).collect()
    }

    /// Elements grouped by [`pseudocolor`](Self::pseudocolor), color 0 first.
    pub fn color_classes(&self) -> Vec<Vec<usize>> {
        let colors = self.pseudocolor();
        let n_colors = colors.iter().max().map_or(0, |&c| c + 1);
        let mut classes = vec![Vec::new(); n_colors];
        for (i, &c) in colors.iter().enumerate() {
            classes[c].push(i);
        }
        classes
    }
}
