//! End-to-end bulk fitting behavior: ordering, progress, cancellation and
//! per-fit failure isolation.

use af_data::{Experiment, GroupedTable};
use af_fit::{fit_all, resolve_configs, CancelToken, FitSettings, ModelSettings};
use af_models::IsothermModel;
use std::sync::{Arc, Mutex};

fn experiment_from(name: &str, pressure: Vec<f64>, uptake: Vec<f64>) -> Experiment {
    let min_pressure = pressure.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_pressure = pressure.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let min_uptake = uptake.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_uptake = uptake.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    Experiment {
        name: name.to_string(),
        temperature: 298.15,
        pressure,
        uptake,
        min_pressure,
        max_pressure,
        min_uptake,
        max_uptake,
    }
}

fn langmuir_experiment(name: &str, k: f64, qsat: f64) -> Experiment {
    let pressure = vec![0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
    let uptake = pressure
        .iter()
        .map(|&p| qsat * (k * p) / (1.0 + k * p))
        .collect();
    experiment_from(name, pressure, uptake)
}

fn sips_experiment(name: &str, k: f64, qsat: f64, n: f64) -> Experiment {
    let pressure = vec![0.5, 1.0, 2.0, 3.0, 5.0, 8.0];
    let uptake = pressure
        .iter()
        .map(|&p: &f64| {
            let kpn = k * p.powf(n);
            qsat * kpn / (1.0 + kpn)
        })
        .collect();
    experiment_from(name, pressure, uptake)
}

fn settings_with(models: &[&str]) -> FitSettings {
    FitSettings {
        models: models.iter().map(|m| ModelSettings::named(m)).collect(),
        ..FitSettings::default()
    }
}

#[test]
fn every_series_covers_every_experiment() {
    let grouped = GroupedTable {
        experiments: vec![
            langmuir_experiment("e1", 0.5, 2.0),
            langmuir_experiment("e2", 0.8, 3.0),
            langmuir_experiment("e3", 0.2, 1.5),
        ],
    };
    let configs = resolve_configs(&FitSettings::default()).unwrap();
    let outcome = fit_all(&grouped, &configs, 1, None, &CancelToken::new()).unwrap();
    assert!(!outcome.is_cancelled());

    let tree = outcome.tree();
    assert_eq!(tree.model_count(), 4);
    for series in &tree.series {
        assert_eq!(series.outcomes.len(), 3);
    }
}

#[test]
fn sips_data_prefers_sips_over_langmuir() {
    let grouped = GroupedTable {
        experiments: vec![
            langmuir_experiment("pure_langmuir", 0.5, 2.0),
            sips_experiment("pure_sips", 0.3, 3.0, 2.0),
        ],
    };
    let configs = resolve_configs(&settings_with(&["Langmuir", "Sips"])).unwrap();
    let tree = fit_all(&grouped, &configs, 1, None, &CancelToken::new())
        .unwrap()
        .into_tree();

    let langmuir = tree.series_for(IsothermModel::Langmuir).unwrap();
    let sips = tree.series_for(IsothermModel::Sips).unwrap();

    // Row 1: Langmuir explains its own data essentially exactly
    assert!(langmuir.outcomes[0].lss() < 1e-12);
    // Row 2: the Sips fit must beat the Langmuir fit strictly
    let sips_lss = sips.outcomes[1].lss();
    let langmuir_lss = langmuir.outcomes[1].lss();
    assert!(sips_lss.is_finite() && langmuir_lss.is_finite());
    assert!(
        sips_lss < langmuir_lss,
        "sips lss {sips_lss:e} should undercut langmuir lss {langmuir_lss:e}"
    );
}

#[test]
fn temkin_failure_does_not_poison_the_run() {
    // All-zero pressures: Langmuir predicts zero uptake everywhere and
    // converges trivially, Temkin hits a log domain error.
    let grouped = GroupedTable {
        experiments: vec![experiment_from(
            "zeros",
            vec![0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        )],
    };
    let configs = resolve_configs(&settings_with(&["Langmuir", "Temkin"])).unwrap();
    let tree = fit_all(&grouped, &configs, 1, None, &CancelToken::new())
        .unwrap()
        .into_tree();

    let langmuir = &tree.series_for(IsothermModel::Langmuir).unwrap().outcomes[0];
    let temkin = &tree.series_for(IsothermModel::Temkin).unwrap().outcomes[0];

    assert!(langmuir.is_converged());
    assert!(!temkin.is_converged());
    assert!(temkin.params().iter().all(|v| v.is_nan()));
    assert!(temkin.lss().is_nan());
    assert_eq!(tree.failed_count(), 1);
}

#[test]
fn progress_is_serialized_and_monotonic() {
    let grouped = GroupedTable {
        experiments: (0..12)
            .map(|i| langmuir_experiment(&format!("e{i}"), 0.4 + 0.01 * i as f64, 2.0))
            .collect(),
    };
    let configs = resolve_configs(&settings_with(&["Langmuir"])).unwrap();

    for workers in [1usize, 4] {
        let calls: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let mut cb = move |done: usize, total: usize| {
            sink.lock().unwrap().push((done, total));
        };
        fit_all(&grouped, &configs, workers, Some(&mut cb), &CancelToken::new()).unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 12, "workers={workers}");
        for (i, &(done, total)) in calls.iter().enumerate() {
            assert_eq!(done, i + 1, "workers={workers}");
            assert_eq!(total, 12, "workers={workers}");
        }
    }
}

#[test]
fn cancel_after_third_experiment_keeps_three() {
    let grouped = GroupedTable {
        experiments: (0..100)
            .map(|i| langmuir_experiment(&format!("e{i}"), 0.5, 2.0))
            .collect(),
    };
    let configs = resolve_configs(&settings_with(&["Langmuir", "Sips"])).unwrap();

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    let mut cb = move |done: usize, _total: usize| {
        if done == 3 {
            trigger.cancel();
        }
    };

    let outcome = fit_all(&grouped, &configs, 1, Some(&mut cb), &cancel).unwrap();
    assert!(outcome.is_cancelled());
    let tree = outcome.tree();
    for series in &tree.series {
        assert_eq!(series.outcomes.len(), 3);
    }
}

#[test]
fn cancel_before_start_returns_empty_tree() {
    let grouped = GroupedTable {
        experiments: vec![langmuir_experiment("e1", 0.5, 2.0)],
    };
    let configs = resolve_configs(&settings_with(&["Langmuir"])).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = fit_all(&grouped, &configs, 1, None, &cancel).unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(outcome.tree().experiment_count(), 0);
}

#[test]
fn parallel_run_matches_sequential_bit_for_bit() {
    let grouped = GroupedTable {
        experiments: (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    langmuir_experiment(&format!("e{i}"), 0.3 + 0.05 * i as f64, 2.5)
                } else {
                    sips_experiment(&format!("e{i}"), 0.2, 3.0, 1.5)
                }
            })
            .collect(),
    };
    let configs = resolve_configs(&FitSettings::default()).unwrap();

    let sequential = fit_all(&grouped, &configs, 1, None, &CancelToken::new())
        .unwrap()
        .into_tree();
    let parallel = fit_all(&grouped, &configs, 8, None, &CancelToken::new())
        .unwrap()
        .into_tree();

    assert_eq!(sequential.model_count(), parallel.model_count());
    for (a, b) in sequential.series.iter().zip(&parallel.series) {
        assert_eq!(a.model, b.model);
        assert_eq!(a.outcomes.len(), b.outcomes.len());
        for (oa, ob) in a.outcomes.iter().zip(&b.outcomes) {
            assert_eq!(oa.lss().to_bits(), ob.lss().to_bits());
            for (pa, pb) in oa.params().iter().zip(ob.params()) {
                assert_eq!(pa.to_bits(), pb.to_bits());
            }
        }
    }
}
