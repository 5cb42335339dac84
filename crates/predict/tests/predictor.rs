use matplan_predict::{
    find_similar_checks, MaterialPredictor, PredictError, PredictionInput, PredictionMethod,
};
use matplan_recon::config::PredictorConfig;
use matplan_recon::model::{
    MasterRecord, MasterView, MatchMethod, MatchedConsumption, MaterialSummary, UtilizationReading, WorkPackage,
};

/// Interleaved history: A320S checks consume 100 parts against a plan of 80,
/// A320N checks consume 20 against a plan of 20.
fn history(n: usize) -> MasterView {
    let rows = (0..n)
        .map(|i| {
            let (ac, consumed, planned) = if i % 2 == 0 { ("A320S", 100, 80) } else { ("A320N", 20, 20) };
            let hours = 5_000.0 + (i * 37 % 11) as f64 * 100.0;
            MasterRecord {
                work_package: WorkPackage {
                    wpno_i: Some(format!("{}", 1000 + i)),
                    wpno: Some(format!("WP-{i}")),
                    ac_registr: Some(format!("OY-R{i:02}")),
                    ac_typ: Some(ac.into()),
                    station: Some(if i % 3 == 0 { "CPH" } else { "TLLM" }.into()),
                    is_c_check: true,
                    ..Default::default()
                },
                duration_days: Some(14.0 + (i % 4) as f64),
                utilization: Some(UtilizationReading {
                    snapshot_date: None,
                    hours: Some(hours),
                    cycles: Some(hours / 2.0),
                    hours_per_cycle: Some(2.0),
                }),
                consumption: Some(MatchedConsumption {
                    wpno_i: format!("{}", 1000 + i),
                    parts_count: consumed,
                    qty: consumed as f64,
                    cost: consumed as f64 * 10.0,
                    avg_price: 10.0,
                    start_date: None,
                    end_date: None,
                    station: None,
                    matched_by: MatchMethod::Direct,
                    categories: Default::default(),
                }),
                consumption_validated: true,
                planned: Some(MaterialSummary {
                    wpno_i: format!("{}", 1000 + i),
                    part_count: planned,
                    total_quantity: planned as f64,
                    total_confirmed_quantity: planned as f64,
                    total_cost: planned as f64 * 10.0,
                    avg_unit_cost: 10.0,
                }),
                parts_variance: None,
                qty_variance: None,
                cost_variance: None,
                planning_accuracy: None,
            }
        })
        .collect();
    MasterView { rows }
}

fn config(confidence_threshold: f64) -> PredictorConfig {
    PredictorConfig {
        n_trees: 25,
        confidence_threshold,
        ..Default::default()
    }
}

fn a320s() -> PredictionInput {
    PredictionInput {
        ac_typ: "A320S".into(),
        station: "CPH".into(),
        duration_days: 15.0,
        ..Default::default()
    }
}

#[test]
fn too_few_checks_is_an_error() {
    let err = MaterialPredictor::train(&history(9), &config(30.0)).unwrap_err();
    assert!(matches!(err, PredictError::InsufficientData { needed: 10, found: 9 }));
}

#[test]
fn learns_type_driven_consumption() {
    let model = MaterialPredictor::train(&history(20), &config(-1.0)).unwrap();

    let stats = model.stats();
    assert_eq!(stats.n_samples, 20);
    assert_eq!(stats.cv_folds, 5);
    assert_eq!(stats.target_mean, 60.0);
    assert_eq!(stats.target_min, 20.0);
    assert_eq!(stats.target_max, 100.0);
    assert!(stats.cv_mean_r2 > 0.9, "cv r2 {}", stats.cv_mean_r2);
    assert_eq!(model.planning_accuracy_factor(), 1.125);

    let p = model.predict(&a320s());
    assert_eq!(p.method, PredictionMethod::MlModel);
    assert_eq!(p.prediction, 100);
    assert_eq!(p.confidence, 100.0);
    assert_eq!((p.ci_lower, p.ci_upper), (100, 100));

    let importance = model.feature_importance();
    assert_eq!(importance.len(), 9);
    assert_eq!(importance[0].0, "Aircraft Type");
}

#[test]
fn fallback_chain() {
    // a threshold above 100 never accepts the model
    let model = MaterialPredictor::train(&history(20), &config(100.5)).unwrap();

    let planned = model.predict_with_fallback(&a320s(), Some(40)).unwrap();
    assert_eq!(planned.method, PredictionMethod::AdjustedPlanned);
    assert_eq!(planned.prediction, 45);
    assert_eq!(planned.confidence, 60.0);
    assert_eq!((planned.ci_lower, planned.ci_upper), (36, 54));
    assert!(planned.std.is_none());

    let average = model.predict_with_fallback(&a320s(), Some(0)).unwrap();
    assert_eq!(average.method, PredictionMethod::HistoricalAverage);
    assert_eq!(average.prediction, 60);
    assert_eq!(average.confidence, 40.0);
    // sample std of ten 20s and ten 100s is ~41.04
    assert_eq!((average.ci_lower, average.ci_upper), (19, 101));

    let accepted = MaterialPredictor::train(&history(20), &config(-1.0))
        .unwrap()
        .predict_with_fallback(&a320s(), Some(40))
        .unwrap();
    assert_eq!(accepted.method, PredictionMethod::MlModel);
}

#[test]
fn training_is_deterministic() {
    let a = MaterialPredictor::train(&history(16), &config(30.0)).unwrap();
    let b = MaterialPredictor::train(&history(16), &config(30.0)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn saved_model_predicts_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let model = MaterialPredictor::train(&history(20), &config(30.0)).unwrap();
    model.save(&path).unwrap();

    let loaded = MaterialPredictor::load(&path).unwrap();
    assert_eq!(loaded, model);
    assert_eq!(loaded.encoders().ac_typ.classes(), ["A320N", "A320S"]);

    let input = PredictionInput {
        ac_typ: "B737".into(),
        ..a320s()
    };
    assert_eq!(loaded.predict(&input), model.predict(&input));
}

#[test]
fn load_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = MaterialPredictor::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, PredictError::ModelIo { .. }));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{\"not\": \"a model\"}").unwrap();
    let err = MaterialPredictor::load(&garbage).unwrap_err();
    assert!(matches!(err, PredictError::ModelFormat { .. }));
}

#[test]
fn similar_checks_from_history() {
    let view = history(12);
    let found = find_similar_checks(&view, &a320s(), 3);
    assert_eq!(found.len(), 3);
    // even rows are A320S; rows 0 and 6 are also at CPH
    assert_eq!(found[0].wpno.as_deref(), Some("WP-0"));
    assert_eq!(found[1].wpno.as_deref(), Some("WP-6"));
    assert_eq!(found[0].similarity_score, 80);
    assert_eq!(found[2].similarity_score, 60);
}
