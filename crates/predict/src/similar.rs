use chrono::NaiveDateTime;
use serde::Serialize;

use matplan_recon::model::{MasterRecord, MasterView};

use crate::features::PredictionInput;

const SAME_TYPE: u32 = 50;
const SAME_STATION: u32 = 20;
const SAME_EOL: u32 = 10;

/// A historical C-check resembling a prediction input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarCheck {
    pub wpno: Option<String>,
    pub wpno_i: Option<String>,
    pub ac_registr: Option<String>,
    pub ac_typ: Option<String>,
    pub check_type: Option<String>,
    pub station: Option<String>,
    pub consumed_parts_count: usize,
    pub consumed_cost: f64,
    pub duration_days: Option<f64>,
    pub start_date: Option<NaiveDateTime>,
    pub similarity_score: u32,
}

fn score(record: &MasterRecord, input: &PredictionInput) -> u32 {
    let wp = &record.work_package;
    let mut s = 0;
    if wp.ac_typ.as_deref() == Some(input.ac_typ.as_str()) {
        s += SAME_TYPE;
    }
    if wp.station.as_deref() == Some(input.station.as_str()) {
        s += SAME_STATION;
    }
    if wp.is_eol == input.is_eol {
        s += SAME_EOL;
    }
    s
}

/// Top `n` C-checks with consumption, ranked by a type/station/EOL score.
/// Ties keep master-view order.
pub fn find_similar_checks(view: &MasterView, input: &PredictionInput, n: usize) -> Vec<SimilarCheck> {
    let mut scored: Vec<(u32, &MasterRecord)> = view
        .c_checks()
        .filter(|r| r.consumption.is_some())
        .map(|r| (score(r, input), r))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(n)
        .map(|(similarity_score, r)| {
            let wp = &r.work_package;
            SimilarCheck {
                wpno: wp.wpno.clone(),
                wpno_i: wp.wpno_i.clone(),
                ac_registr: wp.ac_registr.clone(),
                ac_typ: wp.ac_typ.clone(),
                check_type: wp.check_type.clone(),
                station: wp.station.clone(),
                consumed_parts_count: r.consumed_parts_count().unwrap_or(0),
                consumed_cost: r.consumed_cost().unwrap_or(0.0),
                duration_days: r.duration_days,
                start_date: wp.start_date,
                similarity_score,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use matplan_recon::model::{MatchMethod, MatchedConsumption, WorkPackage};

    fn check(key: &str, ac: &str, station: &str, eol: bool, c_check: bool, parts: Option<usize>) -> MasterRecord {
        MasterRecord {
            work_package: WorkPackage {
                wpno_i: Some(key.into()),
                ac_typ: Some(ac.into()),
                station: Some(station.into()),
                is_c_check: c_check,
                is_eol: eol,
                ..Default::default()
            },
            duration_days: None,
            utilization: None,
            consumption: parts.map(|n| MatchedConsumption {
                wpno_i: key.into(),
                parts_count: n,
                qty: 0.0,
                cost: 10.0 * n as f64,
                avg_price: 0.0,
                start_date: None,
                end_date: None,
                station: None,
                matched_by: MatchMethod::Direct,
                categories: Default::default(),
            }),
            consumption_validated: parts.is_some(),
            planned: None,
            parts_variance: None,
            qty_variance: None,
            cost_variance: None,
            planning_accuracy: None,
        }
    }

    #[test]
    fn ranks_by_score_and_keeps_order_on_ties() {
        let view = MasterView {
            rows: vec![
                check("1", "A320N", "CPH", false, true, Some(5)),
                check("2", "A320S", "OSL", false, true, Some(6)),
                check("3", "A320S", "TLLM", false, true, Some(7)),
                check("4", "A320S", "TLLM", false, false, Some(8)),
                check("5", "A320S", "TLLM", false, true, None),
                check("6", "A320N", "TLLM", true, true, Some(9)),
            ],
        };
        let found = find_similar_checks(&view, &PredictionInput::default(), 10);
        let keys: Vec<_> = found.iter().map(|c| c.wpno_i.as_deref().unwrap_or("")).collect();
        assert_eq!(keys, ["3", "2", "6", "1"]);
        let scores: Vec<_> = found.iter().map(|c| c.similarity_score).collect();
        assert_eq!(scores, [80, 60, 20, 10]);
        assert_eq!(found[0].consumed_cost, 70.0);

        assert_eq!(find_similar_checks(&view, &PredictionInput::default(), 2).len(), 2);
    }
}
