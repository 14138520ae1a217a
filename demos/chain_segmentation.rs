use hmrf_gmm::{Dataset, HmrfConfig, HmrfGmm, NeighborGraph};
use ndarray::Array2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // A noisy two-layer profile along a borehole: 40 samples, 2 features.
    // The upper 25 samples sit near (1, 2), the rest near (4, 0.5).
    let n = 40;
    let features = Array2::from_shape_fn((n, 2), |(i, j)| {
        let wiggle = ((i * 7 + j * 3) % 5) as f64 * 0.1 - 0.2;
        match (i < 25, j) {
            (true, 0) => 1.0 + wiggle,
            (true, _) => 2.0 - wiggle,
            (false, 0) => 4.0 + wiggle,
            (false, _) => 0.5 + wiggle,
        }
    });

    let dataset = Dataset::along_line(features)?;
    let graph = NeighborGraph::chain(dataset.len());
    let config = HmrfConfig::new()
        .with_n_labels(2)
        .with_n_gibbs(50)
        .with_beta(0.5)
        .with_seed(7);

    let mut model = HmrfGmm::from_gmm_seed(dataset, graph, config)?;
    let history = model.fit()?;

    let labels = history.last_labels().unwrap_or_default();
    let profile: String = labels.iter().map(|l| l.to_string()).collect();
    println!("iterations={}", history.iterations());
    println!("labels={profile}");
    if let Some(means) = history.last_means() {
        for (l, row) in means.rows().into_iter().enumerate() {
            println!("  cluster {l}: mean {row}");
        }
    }

    Ok(())
}
