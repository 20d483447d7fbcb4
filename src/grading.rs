use serde_json::Value;

use crate::models::{
    Grade, RawResults, RawScoreRecord, ResultsBySessionAndTerm, ScoreRecord, TermScores,
    UNKNOWN_SUBJECT,
};

/// Tolerant numeric parse. Anything that is not a finite number, or a
/// string holding one, becomes 0.0.
pub fn parse_numeric_or_zero(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            if !value.is_null() {
                log::warn!("non-numeric score {value} treated as 0");
            }
            0.0
        }
    }
}

/// Same rule for text columns coming out of CSV or the database.
pub fn parse_text_or_zero(value: Option<&str>) -> f64 {
    match value {
        Some(text) => parse_numeric_or_zero(&Value::String(text.to_string())),
        None => 0.0,
    }
}

pub fn grade_for_total(total: f64) -> Grade {
    if total >= 80.0 {
        Grade::A
    } else if total >= 70.0 {
        Grade::B
    } else if total >= 60.0 {
        Grade::C
    } else if total >= 50.0 {
        Grade::D
    } else if total >= 40.0 {
        Grade::E
    } else {
        Grade::F
    }
}

pub fn term_scores(record: &ScoreRecord) -> TermScores {
    let total = record.total();
    TermScores {
        total,
        grade: grade_for_total(total),
        first_assessment: record.first_assessment,
        second_assessment: record.second_assessment,
        exam_score: record.exam_score,
    }
}

impl ScoreRecord {
    pub fn from_raw(raw: &RawScoreRecord) -> Self {
        let subject_name = raw
            .subject
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| UNKNOWN_SUBJECT.to_string());

        ScoreRecord {
            subject_name,
            first_assessment: parse_numeric_or_zero(&raw.first_ca),
            second_assessment: parse_numeric_or_zero(&raw.second_ca),
            exam_score: parse_numeric_or_zero(&raw.exam_score),
        }
    }
}

pub fn normalize_results(raw: &RawResults) -> ResultsBySessionAndTerm {
    raw.iter()
        .map(|(session, terms)| {
            let terms = terms
                .iter()
                .map(|(term, records)| {
                    (
                        term.clone(),
                        records.iter().map(ScoreRecord::from_raw).collect(),
                    )
                })
                .collect();
            (session.clone(), terms)
        })
        .collect()
}
