//! `matplan train` and `matplan predict`.

use std::path::PathBuf;

use clap::Args;

use matplan_predict::{categorize_check_type, find_similar_checks, MaterialPredictor, PredictionInput};

use crate::inputs;
use crate::util::{format_currency, format_number, pad_right};
use crate::CliError;

/// Upcoming C-check; omitted values use the model's reference check.
#[derive(Args)]
pub struct CheckArgs {
    /// Aircraft type [default: A320S]
    #[arg(long = "ac-type")]
    ac_type: Option<String>,

    /// Maintenance station [default: TLLM]
    #[arg(long)]
    station: Option<String>,

    /// Total aircraft hours [default: 10000]
    #[arg(long)]
    hours: Option<f64>,

    /// Total aircraft cycles [default: 5000]
    #[arg(long)]
    cycles: Option<f64>,

    /// End-of-lease check
    #[arg(long)]
    eol: bool,

    /// Planned duration in days [default: 18]
    #[arg(long)]
    duration: Option<f64>,

    /// Number of planned parts [default: 0]
    #[arg(long = "planned-parts")]
    planned_parts: Option<usize>,

    /// Planned material cost [default: 0]
    #[arg(long = "planned-cost")]
    planned_cost: Option<f64>,
}

impl CheckArgs {
    fn into_input(self) -> PredictionInput {
        let d = PredictionInput::default();
        PredictionInput {
            ac_typ: self.ac_type.unwrap_or(d.ac_typ),
            aircraft_hours: self.hours.unwrap_or(d.aircraft_hours),
            aircraft_cycles: self.cycles.unwrap_or(d.aircraft_cycles),
            is_eol: self.eol,
            station: self.station.unwrap_or(d.station),
            duration_days: self.duration.unwrap_or(d.duration_days),
            planned_parts_count: self.planned_parts.unwrap_or(d.planned_parts_count),
            planned_cost: self.planned_cost.unwrap_or(d.planned_cost),
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

pub fn cmd_train(config: PathBuf, model: PathBuf, json: bool) -> Result<(), CliError> {
    let session = inputs::open(&config)?;
    let view = session.dashboard.require_master_view()?;
    let predictor = MaterialPredictor::train(view, &session.dashboard.config().predictor)?;
    predictor.save(&model)?;
    eprintln!("wrote {}", model.display());

    let stats = predictor.stats();
    let importance = predictor.feature_importance();
    if json {
        let importance: serde_json::Map<String, serde_json::Value> = importance
            .iter()
            .map(|(label, v)| (label.to_string(), serde_json::json!(v)))
            .collect();
        let out = serde_json::json!({
            "model": model.display().to_string(),
            "stats": stats,
            "planning_accuracy_factor": predictor.planning_accuracy_factor(),
            "feature_importance": importance,
        });
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    println!("Trained on {} C-checks", stats.n_samples);
    println!(
        "  cross-validated R²  {:.3} (+/- {:.3}, {} folds)",
        stats.cv_mean_r2, stats.cv_std_r2, stats.cv_folds
    );
    println!(
        "  parts per check     mean {:.1}, std {:.1}, range {}-{}",
        stats.target_mean, stats.target_std, stats.target_min, stats.target_max
    );
    println!("  planning accuracy factor  {:.2}", predictor.planning_accuracy_factor());
    println!("Feature importance");
    for (label, v) in &importance {
        println!("  {}  {:.3}", pad_right(label, 20), v);
    }
    Ok(())
}

pub fn cmd_predict(
    config: PathBuf,
    model: PathBuf,
    check: CheckArgs,
    similar: usize,
    json: bool,
) -> Result<(), CliError> {
    let predictor = MaterialPredictor::load(&model)?;
    let input = check.into_input();
    let prediction = predictor
        .predict_with_fallback(&input, Some(input.planned_parts_count))
        .ok_or_else(|| CliError::general("no prediction available: model has no training statistics"))?;

    let session = inputs::open(&config)?;
    let similar_checks = session
        .dashboard
        .master_view()
        .map(|view| find_similar_checks(view, &input, similar))
        .unwrap_or_default();

    if json {
        let out = serde_json::json!({
            "input": input,
            "prediction": prediction,
            "similar_checks": similar_checks,
        });
        println!("{}", to_json(&out)?);
        return Ok(());
    }

    println!(
        "{} parts (range {}-{}), confidence {:.1}%",
        prediction.prediction, prediction.ci_lower, prediction.ci_upper, prediction.confidence
    );
    println!("  method: {}", prediction.method);
    println!("  {}", prediction.explanation);

    if !similar_checks.is_empty() {
        println!("Similar historical C-checks");
        for c in &similar_checks {
            println!(
                "  {}  {}  {}  {}  {}  parts {:>6}  cost {:>8}  score {}",
                pad_right(c.wpno.as_deref().unwrap_or("-"), 12),
                pad_right(c.ac_registr.as_deref().unwrap_or("-"), 8),
                pad_right(c.ac_typ.as_deref().unwrap_or("-"), 6),
                pad_right(categorize_check_type(c.check_type.as_deref()), 7),
                pad_right(c.station.as_deref().unwrap_or("-"), 6),
                format_number(Some(c.consumed_parts_count as f64)),
                format_currency(Some(c.consumed_cost)),
                c.similarity_score,
            );
        }
    }
    Ok(())
}
