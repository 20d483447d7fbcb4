use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::flatten_terms;
use crate::grading::{grade_for_total, term_scores};
use crate::models::{Grade, ResultsBySessionAndTerm, TermKey, TermScores};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSubject {
    pub subject_name: String,
    pub scores: TermScores,
}

/// Everything the results page shows for one term.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSummary {
    pub term: TermKey,
    pub subjects: Vec<GradedSubject>,
    pub total_score: f64,
    pub average: f64,
    pub overall_grade: Grade,
    pub highest: Option<String>,
    pub lowest: Option<String>,
    pub grade_distribution: BTreeMap<Grade, usize>,
}

impl TermSummary {
    pub fn subject_count(&self) -> usize {
        self.subjects.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub term: TermKey,
    pub average: f64,
    pub change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPoint {
    pub term: TermKey,
    pub total: f64,
    pub grade: Grade,
}

pub fn term_summaries(results: &ResultsBySessionAndTerm) -> Vec<TermSummary> {
    flatten_terms(results)
        .into_iter()
        .map(|entry| {
            let mut subjects: Vec<GradedSubject> = entry
                .records
                .iter()
                .map(|record| GradedSubject {
                    subject_name: record.subject_name.clone(),
                    scores: term_scores(record),
                })
                .collect();
            subjects.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));

            let total_score: f64 = subjects.iter().map(|s| s.scores.total).sum();
            let average = if subjects.is_empty() {
                0.0
            } else {
                total_score / subjects.len() as f64
            };

            let mut grade_distribution: BTreeMap<Grade, usize> = BTreeMap::new();
            for subject in &subjects {
                *grade_distribution.entry(subject.scores.grade).or_insert(0) += 1;
            }

            // first subject wins ties
            let highest = subjects
                .iter()
                .fold(None::<&GradedSubject>, |best, s| match best {
                    Some(b) if b.scores.total >= s.scores.total => Some(b),
                    _ => Some(s),
                })
                .map(|s| s.subject_name.clone());
            let lowest = subjects
                .iter()
                .fold(None::<&GradedSubject>, |worst, s| match worst {
                    Some(w) if w.scores.total <= s.scores.total => Some(w),
                    _ => Some(s),
                })
                .map(|s| s.subject_name.clone());

            TermSummary {
                term: entry.key(),
                subjects,
                total_score,
                average,
                overall_grade: grade_for_total(average),
                highest,
                lowest,
                grade_distribution,
            }
        })
        .collect()
}

pub fn progress_timeline(results: &ResultsBySessionAndTerm) -> Vec<ProgressPoint> {
    let mut points: Vec<ProgressPoint> = Vec::new();

    for summary in term_summaries(results) {
        let change = points.last().map(|p| summary.average - p.average);
        points.push(ProgressPoint {
            term: summary.term,
            average: summary.average,
            change,
        });
    }

    points
}

pub fn subject_history(results: &ResultsBySessionAndTerm) -> BTreeMap<String, Vec<SubjectPoint>> {
    let mut history: BTreeMap<String, Vec<SubjectPoint>> = BTreeMap::new();

    for entry in flatten_terms(results) {
        for record in entry.records {
            let scores = term_scores(record);
            history
                .entry(record.subject_name.clone())
                .or_default()
                .push(SubjectPoint {
                    term: entry.key(),
                    total: scores.total,
                    grade: scores.grade,
                });
        }
    }

    history
}

/// Most recent point of every subject the student has ever taken.
pub fn latest_subjects(results: &ResultsBySessionAndTerm) -> BTreeMap<String, SubjectPoint> {
    subject_history(results)
        .into_iter()
        .filter_map(|(name, mut points)| points.pop().map(|p| (name, p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreRecord;

    fn sample() -> ResultsBySessionAndTerm {
        let mut results = ResultsBySessionAndTerm::new();
        let first = results.entry("2023/2024".to_string()).or_default();
        first.insert(
            "First Term".to_string(),
            vec![
                ScoreRecord::new("Mathematics", 10.0, 10.0, 40.0),
                ScoreRecord::new("English Language", 15.0, 15.0, 45.0),
            ],
        );
        first.insert(
            "Third Term".to_string(),
            vec![
                ScoreRecord::new("Mathematics", 18.0, 18.0, 50.0),
                ScoreRecord::new("English Language", 12.0, 12.0, 30.0),
                ScoreRecord::new("Agriculture", 10.0, 10.0, 20.0),
            ],
        );
        results.entry("2024/2025".to_string()).or_default().insert(
            "First Term".to_string(),
            vec![ScoreRecord::new("Mathematics", 20.0, 20.0, 55.0)],
        );
        results
    }

    #[test]
    fn summarises_each_term_in_order() {
        let summaries = term_summaries(&sample());
        assert_eq!(summaries.len(), 3);

        let first = &summaries[0];
        assert_eq!(first.term.term, "First Term");
        assert_eq!(first.total_score, 135.0);
        assert_eq!(first.average, 67.5);
        assert_eq!(first.overall_grade, Grade::C);
        assert_eq!(first.highest.as_deref(), Some("English Language"));
        assert_eq!(first.lowest.as_deref(), Some("Mathematics"));
        assert_eq!(first.subject_count(), 2);

        let third = &summaries[1];
        assert_eq!(third.grade_distribution.get(&Grade::A), Some(&1));
        assert_eq!(third.grade_distribution.get(&Grade::D), Some(&1));
        assert_eq!(third.grade_distribution.get(&Grade::E), Some(&1));
        assert_eq!(third.lowest.as_deref(), Some("Agriculture"));

        assert_eq!(summaries[2].term.session, "2024/2025");
    }

    #[test]
    fn timeline_tracks_change_between_terms() {
        let points = progress_timeline(&sample());
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].change, None);
        assert_eq!(points[1].average, 60.0);
        assert_eq!(points[1].change, Some(-7.5));
        assert_eq!(points[2].change, Some(35.0));
    }

    #[test]
    fn timeline_skips_empty_terms() {
        let mut results = sample();
        results
            .entry("2024/2025".to_string())
            .or_default()
            .insert("Second Term".to_string(), Vec::new());
        assert_eq!(progress_timeline(&results).len(), 3);
        assert_eq!(term_summaries(&results).len(), 3);
    }

    #[test]
    fn history_is_chronological_per_subject() {
        let history = subject_history(&sample());
        let maths = &history["Mathematics"];
        let totals: Vec<f64> = maths.iter().map(|p| p.total).collect();
        assert_eq!(totals, vec![60.0, 86.0, 95.0]);
        assert_eq!(history["Agriculture"].len(), 1);
    }

    #[test]
    fn latest_subjects_keep_last_seen_term() {
        let latest = latest_subjects(&sample());
        assert_eq!(latest.len(), 3);
        assert_eq!(latest["Mathematics"].term.session, "2024/2025");
        assert_eq!(latest["English Language"].grade, Grade::D);
        assert_eq!(latest["Agriculture"].term.term, "Third Term");
    }
}
