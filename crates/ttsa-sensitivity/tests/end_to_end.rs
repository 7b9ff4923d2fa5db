use approx::assert_abs_diff_eq;
use ttsa_sensitivity::report::{combination_listing, index_listing, resolve_variables};
use ttsa_sensitivity::{
    build_surrogate, power_set, set_choose, DirectionalCovariance, EngineConfig, ModelRegistry,
    SensitivityError, SensitivityIndices, Surrogate,
};
use ttsa_tensortrain::AbstractTensorTrain;

fn surrogate(key: &str, config: &EngineConfig) -> Surrogate {
    let registry = ModelRegistry::with_builtins();
    build_surrogate(&registry.resolve(key).unwrap(), config).unwrap()
}

#[test]
fn test_linear_model_first_order_shares() {
    let config = EngineConfig::default();
    let s = surrogate("linear", &config);
    assert_eq!(s.tensor.site_dims(), vec![64; 4]);
    // far fewer evaluations than the 64^4 grid
    assert!(s.n_evals < 64usize.pow(4) / 10);

    let idx = SensitivityIndices::new(&s.tensor, &config).unwrap();
    let coefficients = [2.4f64, 0.5, -1.2, -2.0];
    let total: f64 = coefficients.iter().map(|a| a * a).sum();
    for (i, a) in coefficients.iter().enumerate() {
        assert_abs_diff_eq!(idx.variance_component(&[i]).unwrap(), a * a / total, epsilon = 1e-4);
    }
    for subset in power_set(4, 2, 4, &[], &[]).unwrap() {
        assert_abs_diff_eq!(idx.variance_component(&subset).unwrap(), 0.0, epsilon = 1e-4);
    }
    assert_abs_diff_eq!(idx.mean_dimension().unwrap(), 1.0, epsilon = 1e-4);
}

#[test]
fn test_polynomial_model_full_set() {
    let config = EngineConfig::default();
    let s = surrogate("polynomial", &config);
    let idx = SensitivityIndices::new(&s.tensor, &config).unwrap();
    assert_abs_diff_eq!(idx.total_index(&[0, 1]).unwrap(), 1.0, epsilon = 1e-4);
    assert_abs_diff_eq!(idx.closed_index(&[0, 1]).unwrap(), 1.0, epsilon = 1e-4);
    // the superset index of the full set is the pure interaction share
    assert_abs_diff_eq!(
        idx.superset_index(&[0, 1]).unwrap(),
        idx.variance_component(&[0, 1]).unwrap(),
        epsilon = 1e-10
    );
}

#[test]
fn test_index_families_are_ordered() {
    let config = EngineConfig::default();
    let s = surrogate("wake", &config);
    let idx = SensitivityIndices::new(&s.tensor, &config).unwrap();

    assert_abs_diff_eq!(idx.variance_component(&[]).unwrap(), 0.0);
    assert_abs_diff_eq!(idx.variance_components().sum(), 1.0, epsilon = 1e-4);
    for subset in power_set(4, 1, 4, &[], &[]).unwrap() {
        let st = idx.variance_component(&subset).unwrap();
        assert!(idx.closed_index(&subset).unwrap() >= st - 1e-4);
        assert!(idx.superset_index(&subset).unwrap() >= st - 1e-4);
        assert!(idx.total_index(&subset).unwrap() >= idx.closed_index(&subset).unwrap() - 1e-4);
        assert!(st >= -1e-4);
    }
    // superset >= closed only for single variables; for larger subsets the
    // closed index also collects the proper subsets, e.g. closed([0..4]) = 1
    for v in 0..4 {
        assert!(idx.superset_index(&[v]).unwrap() >= idx.closed_index(&[v]).unwrap() - 1e-4);
    }
    assert_abs_diff_eq!(idx.closed_index(&[0, 1, 2, 3]).unwrap(), 1.0, epsilon = 1e-4);
    assert!(
        idx.superset_index(&[0, 1, 2, 3]).unwrap()
            <= idx.closed_index(&[0, 1, 2, 3]).unwrap() + 1e-4
    );
}

#[test]
fn test_directional_covariance_is_normalized() {
    let config = EngineConfig::default().with_ticks(32);
    let s = surrogate("linear", &config);
    let dc = DirectionalCovariance::new(&s.tensor, &config).unwrap();
    let peak = dc
        .tensor()
        .fulltensor()
        .into_iter()
        .fold(0.0f64, |m, v| m.max(v.abs()));
    assert_abs_diff_eq!(peak, 1.0, epsilon = 1e-8);
    // x_1 pushes the output up, x_4 down
    assert!(dc.index(&[0]).unwrap() > 0.0);
    assert!(dc.index(&[3]).unwrap() < 0.0);
    assert!(matches!(
        dc.index(&[2, 2]),
        Err(SensitivityError::DuplicateVariable { variable: 2 })
    ));
}

#[test]
fn test_duplicate_variables_rejected() {
    let config = EngineConfig::default().with_ticks(16);
    let s = surrogate("polynomial", &config);
    let idx = SensitivityIndices::new(&s.tensor, &config).unwrap();
    assert!(set_choose(idx.closed_indices(), &[1, 1]).is_err());
    assert!(idx.total_index(&[0, 0]).is_err());
    assert!(matches!(
        resolve_variables(Some(&[1, 1]), 2),
        Err(SensitivityError::DuplicateVariable { variable: 1 })
    ));
}

#[test]
fn test_reports_for_a_variable_selection() {
    let config = EngineConfig::default().with_ticks(16).with_max_order(2);
    let s = surrogate("wake", &config);
    let variables = resolve_variables(Some(&[4, 1, 3]), s.num_variables()).unwrap();

    let combos = combination_listing(&s.names, &variables, config.max_order);
    let json = serde_json::to_value(&combos).unwrap();
    assert_eq!(json["order"], 2);
    assert_eq!(json["sets"][0]["1"], serde_json::json!([[4], [1], [3]]));
    assert_eq!(json["sets"][0]["2"], serde_json::json!([[4, 1], [4, 3], [1, 3]]));

    let listing = index_listing(&s.tensor, &variables, &config, true).unwrap();
    assert_eq!(listing.order, 4);
    assert_eq!(listing.od, 2);
    assert_eq!(listing.chosenorder, 3);
    let pairs = &listing.nodes[0][&2];
    assert_eq!(pairs.dc.len(), 3);
    for v in pairs.closed.iter().chain(&pairs.total) {
        assert!((-1e-3..=1.0 + 1e-3).contains(v));
    }
    let relatives = listing.relatives.unwrap();
    for group in relatives[0].values() {
        for per_size in group {
            for value in per_size.iter().flatten() {
                assert!((0.0..=1.0).contains(value));
            }
        }
    }
}
