use std::fmt::Write;

use chrono::NaiveDate;

use crate::analysis;
use crate::models::{PerformanceAnalysis, ResultsBySessionAndTerm, StudentProfile};
use crate::progress::{self, ProgressPoint, TermSummary};
use crate::remarks::{self, RemarkPickers};

fn student_label(profile: Option<&StudentProfile>) -> String {
    match profile {
        Some(p) => format!("{} ({}, {})", p.full_name, p.admission_number, p.class_name),
        None => "student".to_string(),
    }
}

fn name_list(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

pub fn build_report_card(
    profile: Option<&StudentProfile>,
    summary: &TermSummary,
    pickers: &mut RemarkPickers,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Report Card: {}", summary.term);
    let _ = writeln!(output, "Student: {}", student_label(profile));
    let _ = writeln!(output);
    let _ = writeln!(output, "| Subject | 1st CA | 2nd CA | Exam | Total | Grade |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");

    for subject in &summary.subjects {
        let s = &subject.scores;
        let _ = writeln!(
            output,
            "| {} | {} | {} | {} | {} | {} |",
            subject.subject_name,
            s.first_assessment,
            s.second_assessment,
            s.exam_score,
            s.total,
            s.grade
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Total score {} across {} subjects, average {:.2} (grade {})",
        summary.total_score,
        summary.subject_count(),
        summary.average,
        summary.overall_grade
    );
    if let (Some(highest), Some(lowest)) = (&summary.highest, &summary.lowest) {
        let _ = writeln!(output, "Best subject: {highest}. Weakest subject: {lowest}.");
    }

    let distribution: Vec<String> = summary
        .grade_distribution
        .iter()
        .map(|(grade, count)| format!("{grade}: {count}"))
        .collect();
    let _ = writeln!(output, "Grades: {}", name_list(&distribution));
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Class teacher: {}",
        remarks::teacher_remark(summary.average, pickers.teacher.as_mut())
    );
    let _ = writeln!(
        output,
        "Principal: {}",
        remarks::principal_remark(summary.average, pickers.principal.as_mut())
    );

    output
}

pub fn build_analysis_report(analysis: &PerformanceAnalysis, timeline: &[ProgressPoint]) -> String {
    let mut output = String::new();
    let overall = &analysis.overall;

    let _ = writeln!(output, "## Performance Analysis");
    match (&analysis.current_term, &analysis.previous_term) {
        (Some(current), Some(previous)) => {
            let _ = writeln!(output, "Comparing {current} with {previous}");
        }
        (Some(current), None) => {
            let _ = writeln!(output, "Only {current} is available");
        }
        _ => {
            let _ = writeln!(output, "No results recorded yet.");
        }
    }
    let _ = writeln!(output, "Overall trend: {}", overall.overall_trend.label());
    if let (Some(current), Some(previous)) = (overall.current_average, overall.previous_average) {
        let _ = writeln!(
            output,
            "Average of shared subjects: {previous:.2} -> {current:.2}"
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "- Strengths: {}", name_list(&overall.strengths));
    let _ = writeln!(output, "- Needs work: {}", name_list(&overall.weaknesses));
    let _ = writeln!(output, "- Concerns: {}", name_list(&overall.concerns));
    let _ = writeln!(output, "- Improved: {}", name_list(&overall.improvements));

    for (name, subject) in analysis.subjects.iter().filter(|(_, s)| s.is_comparable()) {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {name}");
        if let (Some(current), Some(previous)) = (&subject.current_term, &subject.previous_term) {
            let _ = writeln!(
                output,
                "{} ({}) from {} ({}), change {:+}",
                current.total,
                current.grade,
                previous.total,
                previous.grade,
                subject.improvement.unwrap_or_default()
            );
        }
        if !subject.weak_areas.is_empty() {
            let _ = writeln!(output, "Weak areas:");
            for area in &subject.weak_areas {
                let _ = writeln!(output, "- {area}");
            }
        }
        let _ = writeln!(output, "Recommendations:");
        for item in &subject.recommendations {
            let _ = writeln!(output, "- {item}");
        }
        let _ = writeln!(output, "Study plan:");
        for week in &subject.study_plan {
            let _ = writeln!(
                output,
                "- {} ({}, {}): {}",
                week.week_label,
                week.focus,
                week.time_commitment,
                week.activities.join("; ")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Progress");
    if timeline.is_empty() {
        let _ = writeln!(output, "No terms recorded.");
    } else {
        for point in timeline {
            match point.change {
                Some(change) => {
                    let _ = writeln!(
                        output,
                        "- {}: average {:.2} ({:+.2})",
                        point.term, point.average, change
                    );
                }
                None => {
                    let _ = writeln!(output, "- {}: average {:.2}", point.term, point.average);
                }
            }
        }
    }

    output
}

pub fn build_report(
    profile: Option<&StudentProfile>,
    results: &ResultsBySessionAndTerm,
    pickers: &mut RemarkPickers,
    generated_on: NaiveDate,
) -> String {
    let summaries = progress::term_summaries(results);
    let analysis = analysis::analyze_results(results);
    let timeline = progress::progress_timeline(results);

    let mut output = String::new();
    let _ = writeln!(output, "# Student Result Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        student_label(profile),
        generated_on
    );
    let _ = writeln!(output);

    match summaries.last() {
        Some(latest) => output.push_str(&build_report_card(profile, latest, pickers)),
        None => {
            let _ = writeln!(output, "No results recorded for this student.");
        }
    }

    let _ = writeln!(output);
    output.push_str(&build_analysis_report(&analysis, &timeline));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreRecord;
    
    fn profile() -> StudentProfile {
        StudentProfile {
            admission_number: "GSS/2021/014".to_string(),
            full_name: "Amara Okafor".to_string(),
            class_name: "JSS 3A".to_string(),
        }
    }

    fn two_terms() -> ResultsBySessionAndTerm {
        let mut results = ResultsBySessionAndTerm::new();
        let session = results.entry("2024/2025".to_string()).or_default();
        session.insert(
            "First Term".to_string(),
            vec![
                ScoreRecord::new("Mathematics", 10.0, 10.0, 40.0),
                ScoreRecord::new("Basic Science", 14.0, 14.0, 30.0),
            ],
        );
        session.insert(
            "Second Term".to_string(),
            vec![
                ScoreRecord::new("Mathematics", 18.0, 18.0, 55.0),
                ScoreRecord::new("Basic Science", 12.0, 12.0, 20.0),
            ],
        );
        results
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    #[test]
    fn report_includes_card_and_analysis() {
        let mut pickers = RemarkPickers::round_robin();
        let report = build_report(Some(&profile()), &two_terms(), &mut pickers, date());

        assert!(report.contains("# Student Result Report"));
        assert!(report.contains("Amara Okafor (GSS/2021/014, JSS 3A)"));
        assert!(report.contains("## Report Card: 2024/2025 Second Term"));
        assert!(report.contains("| Mathematics | 18 | 18 | 55 | 91 | A |"));
        assert!(report.contains("Comparing 2024/2025 Second Term with 2024/2025 First Term"));
        assert!(report.contains("- Strengths: Mathematics"));
        assert!(report.contains("- Concerns: Basic Science"));
        assert!(report.contains("### Basic Science"));
        assert!(report.contains("Class teacher: A very good result. Aim higher next term."));
        assert!(report.contains("Principal: Very good result. Keep working hard."));
    }

    #[test]
    fn empty_results_render_placeholders() {
        let mut pickers = RemarkPickers::round_robin();
        let report = build_report(None, &ResultsBySessionAndTerm::new(), &mut pickers, date());
        assert!(report.contains("No results recorded for this student."));
        assert!(report.contains("Overall trend: insufficient data"));
        assert!(report.contains("- Strengths: none"));
        assert!(report.contains("No terms recorded."));
    }

    #[test]
    fn progress_section_shows_signed_change() {
        let results = two_terms();
        let analysis = analysis::analyze_results(&results);
        let timeline = progress::progress_timeline(&results);
        let text = build_analysis_report(&analysis, &timeline);
        assert!(text.contains("- 2024/2025 First Term: average 59.00"));
        assert!(text.contains("- 2024/2025 Second Term: average 67.50 (+8.50)"));
    }
}
