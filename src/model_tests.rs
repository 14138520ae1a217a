#[cfg(test)]
mod tests {
    use crate::beta::BetaSchedule;
    use crate::config::{HmrfConfig, SweepOrder};
    use crate::data::Dataset;
    use crate::energy::SelfEnergy;
    use crate::graph::NeighborGraph;
    use crate::linalg::symmetric_eigen;
    use crate::model::HmrfGmm;
    use crate::seed::InitialParameters;
    use crate::{Error, Result};
    use ndarray::{array, Array2, Array3};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn line_dataset() -> Dataset {
        Dataset::along_line(array![[0.0], [0.0], [0.0], [5.0], [5.0]]).unwrap()
    }

    fn unit_init() -> InitialParameters {
        InitialParameters::new(array![[0.0], [5.0]], Array3::from_elem((2, 1, 1), 1.0))
    }

    fn line_config() -> HmrfConfig {
        HmrfConfig::new()
            .with_n_labels(2)
            .with_beta(0.5)
            .with_n_gibbs(20)
            .with_seed(42)
    }

    fn assert_line_partition(labels: &[usize]) {
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[2], labels[3]);
    }

    #[test]
    fn test_line_separates_after_fit() -> Result<()> {
        init_logger();
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let mut model = HmrfGmm::new(ds, graph, unit_init(), line_config())?;
        let history = model.fit()?;

        let last = history.last_labels().ok_or(Error::EmptyInput)?;
        assert_line_partition(last);
        Ok(())
    }

    #[test]
    fn test_line_separates_from_gmm_seed() -> Result<()> {
        init_logger();
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let mut model = HmrfGmm::from_gmm_seed(ds, graph, line_config())?;
        assert_line_partition(&model.history().labels()[0]);

        let history = model.fit()?;
        assert_line_partition(history.last_labels().ok_or(Error::EmptyInput)?);
        Ok(())
    }

    #[test]
    fn test_line_separates_with_checkerboard_sweep() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let config = line_config().with_sweep_order(SweepOrder::Checkerboard);
        let mut model = HmrfGmm::new(ds, graph, unit_init(), config)?;
        let history = model.fit()?;
        assert_line_partition(history.last_labels().ok_or(Error::EmptyInput)?);
        Ok(())
    }

    #[test]
    fn test_history_invariants() -> Result<()> {
        let ds = Dataset::along_line(array![
            [0.0, 0.1],
            [0.2, -0.1],
            [0.1, 0.0],
            [4.0, 4.2],
            [4.1, 3.9],
            [3.9, 4.0]
        ])?;
        let graph = NeighborGraph::chain(ds.len());
        let init = InitialParameters::new(
            array![[0.0, 0.0], [4.0, 4.0]],
            Array3::from_shape_vec((2, 2, 2), vec![1.0, 0.2, 0.2, 1.0, 0.5, 0.0, 0.0, 0.5]).unwrap(),
        );
        let config = HmrfConfig::new()
            .with_n_gibbs(15)
            .with_cov_step(0.01)
            .with_mu_step(0.01)
            .with_seed(3);
        let mut model = HmrfGmm::new(ds, graph, init, config)?;
        let history = model.fit()?;

        assert_eq!(history.len(), 16);
        assert_eq!(history.means().len(), 16);
        assert_eq!(history.covariances().len(), 16);
        assert_eq!(history.labels().len(), 16);
        assert_eq!(history.betas().len(), 16);

        for labels in history.labels() {
            assert_eq!(labels.len(), 6);
            assert!(labels.iter().all(|&l| l < 2));
        }
        for covs in history.covariances() {
            for cov in covs.outer_iter() {
                assert!((cov[[0, 1]] - cov[[1, 0]]).abs() < 1e-12);
                let eig = symmetric_eigen(cov);
                assert!(eig.values.iter().all(|&l| l > 0.0));
            }
        }
        assert!(history.betas().iter().all(|&b| b == 0.5));
        Ok(())
    }

    #[test]
    fn test_zero_steps_keep_means() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let config = line_config()
            .with_n_gibbs(5)
            .with_mu_step(0.0)
            .with_cov_step(0.0)
            .with_rotation_std(0.0);
        let mut model = HmrfGmm::new(ds, graph, unit_init(), config)?;
        let history = model.fit()?;
        for means in history.means() {
            assert_eq!(means, &array![[0.0], [5.0]]);
        }
        Ok(())
    }

    #[test]
    fn test_step_reports_and_stops() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let mut model = HmrfGmm::new(ds, graph, unit_init(), line_config().with_n_gibbs(2))?;

        let first = model.step()?;
        assert_eq!(first.iteration, 1);
        assert_eq!(first.accepted.len(), 2);
        let _ = model.step()?;
        assert_eq!(model.history().iterations(), 2);
        assert!(matches!(
            model.step(),
            Err(Error::InvalidParameter { name: "n_gibbs", .. })
        ));
        Ok(())
    }

    #[test]
    fn test_initial_labels_from_likelihood() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let model = HmrfGmm::new(ds, graph, unit_init(), line_config())?;
        assert_eq!(model.history().labels()[0], vec![0, 0, 0, 1, 1]);
        assert_eq!(model.history().betas()[0], 0.5);
        Ok(())
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let graph = NeighborGraph::chain(5);

        // feature count
        let init = InitialParameters::new(array![[0.0, 0.0], [5.0, 5.0]], Array3::from_elem((2, 2, 2), 1.0));
        let err = HmrfGmm::new(line_dataset(), graph.clone(), init, line_config()).unwrap_err();
        assert!(err.is_configuration());

        // label count
        let init = InitialParameters::new(array![[0.0], [5.0], [9.0]], Array3::from_elem((3, 1, 1), 1.0));
        let err = HmrfGmm::new(line_dataset(), graph.clone(), init, line_config()).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));

        // graph size
        let err = HmrfGmm::new(line_dataset(), NeighborGraph::chain(4), unit_init(), line_config())
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));

        // label out of range
        let init = unit_init().with_labels(vec![0, 0, 2, 1, 1]);
        let err = HmrfGmm::new(line_dataset(), graph.clone(), init, line_config()).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidLabel {
                element: 2,
                label: 2,
                n_labels: 2
            }
        );

        // covariance not positive-definite
        let init = InitialParameters::new(array![[0.0], [5.0]], Array3::from_shape_vec((2, 1, 1), vec![1.0, -1.0]).unwrap())
            .with_labels(vec![0; 5]);
        let err = HmrfGmm::new(line_dataset(), graph, init, line_config()).unwrap_err();
        assert!(err.is_numerical());
    }

    #[derive(Debug)]
    struct Doubling;

    impl BetaSchedule for Doubling {
        fn next_beta(&self, _iteration: usize, previous: f64) -> f64 {
            previous * 2.0
        }
    }

    #[test]
    fn test_custom_beta_schedule_recorded() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let mut model = HmrfGmm::new(ds, graph, unit_init(), line_config().with_n_gibbs(3))?
            .with_beta_schedule(Box::new(Doubling));
        let history = model.fit()?;
        assert_eq!(history.betas(), &[0.5, 1.0, 2.0, 4.0]);
        Ok(())
    }

    #[derive(Debug)]
    struct PinToZero;

    impl SelfEnergy for PinToZero {
        fn self_energy(&self, _element: usize, label: usize) -> f64 {
            if label == 0 {
                0.0
            } else {
                f64::INFINITY
            }
        }
    }

    #[test]
    fn test_self_energy_override_reaches_sampler() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let mut model = HmrfGmm::new(ds, graph, unit_init(), line_config().with_n_gibbs(3))?
            .with_self_energy(Box::new(PinToZero));
        let report = model.step()?;
        assert_eq!(report.degenerate, 5);
        assert_eq!(model.history().last_labels(), Some(&[0, 0, 0, 0, 0][..]));
        Ok(())
    }

    #[test]
    fn test_two_dimensional_grid_graph() -> Result<()> {
        // 2x3 grid, left column near 0, right columns near 6
        let coords = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]];
        let features = array![[0.0], [6.0], [6.0], [0.0], [6.0], [6.0]];
        let ds = Dataset::new(coords, features)?;
        let graph = NeighborGraph::from_adjacency(vec![
            vec![1, 3],
            vec![0, 2, 4],
            vec![1, 5],
            vec![0, 4],
            vec![1, 3, 5],
            vec![2, 4],
        ])?;
        let init = InitialParameters::new(array![[0.0], [6.0]], Array3::from_elem((2, 1, 1), 1.0));
        let mut model = HmrfGmm::new(ds, graph, init, line_config().with_n_gibbs(10))?;
        let history = model.fit()?;
        let labels = history.last_labels().ok_or(Error::EmptyInput)?;
        assert_eq!(labels[0], labels[3]);
        assert_eq!(labels[1], labels[2]);
        assert_eq!(labels[1], labels[4]);
        assert_eq!(labels[1], labels[5]);
        assert_ne!(labels[0], labels[1]);
        Ok(())
    }

    #[test]
    fn test_history_means_are_fresh_arrays() -> Result<()> {
        let ds = line_dataset();
        let graph = NeighborGraph::chain(ds.len());
        let mut model = HmrfGmm::new(ds, graph, unit_init(), line_config().with_mu_step(0.05))?;
        let snapshot: Array2<f64> = model.history().means()[0].clone();
        let _ = model.fit()?;
        assert_eq!(model.history().means()[0], snapshot);
        Ok(())
    }
}
