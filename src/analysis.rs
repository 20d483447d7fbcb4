use std::collections::BTreeMap;

use crate::grading::term_scores;
use crate::models::{
    OverallAnalysis, OverallTrend, PerformanceAnalysis, ResultsBySessionAndTerm, ScoreRecord,
    StudyPlanWeek, SubjectAnalysis, TermKey, TermScores,
};

pub const MAX_RECOMMENDATIONS: usize = 6;

const STRENGTH_THRESHOLD: f64 = 70.0;
const WEAKNESS_THRESHOLD: f64 = 50.0;
const TREND_SIGNIFICANT: f64 = 5.0;

/// One populated (session, term) slot of a student's results.
#[derive(Debug, Clone, Copy)]
pub struct TermEntry<'a> {
    pub session: &'a str,
    pub term: &'a str,
    pub records: &'a [ScoreRecord],
}

impl TermEntry<'_> {
    pub fn key(&self) -> TermKey {
        TermKey {
            session: self.session.to_string(),
            term: self.term.to_string(),
        }
    }
}

/// Position of a term inside its session. Unrecognised labels go last.
pub fn term_order(term: &str) -> u8 {
    match term {
        "First Term" => 1,
        "Second Term" => 2,
        "Third Term" => 3,
        _ => 4,
    }
}

/// Chronological populated terms. Term keys with no records are skipped.
pub fn flatten_terms(results: &ResultsBySessionAndTerm) -> Vec<TermEntry<'_>> {
    let mut entries: Vec<TermEntry<'_>> = results
        .iter()
        .flat_map(|(session, terms)| {
            terms
                .iter()
                .filter(|(_, records)| !records.is_empty())
                .map(move |(term, records)| TermEntry {
                    session: session.as_str(),
                    term: term.as_str(),
                    records: records.as_slice(),
                })
        })
        .collect();

    entries.sort_by(|a, b| {
        a.session
            .cmp(b.session)
            .then_with(|| term_order(a.term).cmp(&term_order(b.term)))
    });
    entries
}

/// Returns (current, previous): the last and second-to-last entries.
pub fn select_terms<'a, 'b>(
    entries: &'b [TermEntry<'a>],
) -> (Option<&'b TermEntry<'a>>, Option<&'b TermEntry<'a>>) {
    match entries {
        [] => (None, None),
        [only] => (Some(only), None),
        [.., previous, current] => (Some(current), Some(previous)),
    }
}

/// Builds the per-subject map from the current term. Previous-term
/// records only attach to subjects already present.
pub fn compare_subjects(
    current: &[ScoreRecord],
    previous: Option<&[ScoreRecord]>,
) -> BTreeMap<String, SubjectAnalysis> {
    let mut subjects: BTreeMap<String, SubjectAnalysis> = BTreeMap::new();

    for record in current {
        let entry = subjects.entry(record.subject_name.clone()).or_default();
        entry.current_term = Some(term_scores(record));
    }

    for record in previous.unwrap_or_default() {
        let Some(entry) = subjects.get_mut(&record.subject_name) else {
            continue;
        };
        let scores = term_scores(record);
        entry.improvement = entry
            .current_term
            .as_ref()
            .map(|current| current.total - scores.total);
        entry.previous_term = Some(scores);
    }

    subjects
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSummary {
    pub trend: OverallTrend,
    pub current_average: Option<f64>,
    pub previous_average: Option<f64>,
}

pub fn classify_delta(delta: f64) -> OverallTrend {
    if delta > TREND_SIGNIFICANT {
        OverallTrend::SignificantImprovement
    } else if delta > 0.0 {
        OverallTrend::ModerateImprovement
    } else if delta > -TREND_SIGNIFICANT {
        OverallTrend::Stable
    } else {
        OverallTrend::Declining
    }
}

pub fn classify_trend(subjects: &BTreeMap<String, SubjectAnalysis>) -> TrendSummary {
    let pairs: Vec<(f64, f64)> = subjects
        .values()
        .filter_map(|s| match (&s.current_term, &s.previous_term) {
            (Some(c), Some(p)) => Some((c.total, p.total)),
            _ => None,
        })
        .collect();

    if pairs.is_empty() {
        return TrendSummary {
            trend: OverallTrend::InsufficientData,
            current_average: None,
            previous_average: None,
        };
    }

    let count = pairs.len() as f64;
    let avg_current = pairs.iter().map(|(c, _)| c).sum::<f64>() / count;
    let avg_previous = pairs.iter().map(|(_, p)| p).sum::<f64>() / count;

    TrendSummary {
        trend: classify_delta(avg_current - avg_previous),
        current_average: Some(avg_current),
        previous_average: Some(avg_previous),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Strength,
    Weakness,
    Concern,
}

pub fn categorize(total: f64) -> Category {
    if total >= STRENGTH_THRESHOLD {
        Category::Strength
    } else if total >= WEAKNESS_THRESHOLD {
        Category::Weakness
    } else {
        Category::Concern
    }
}

const TIER_STRUGGLING: [&str; 4] = [
    "Book extra lessons with your subject teacher each week",
    "Go back over the foundation topics covered this term",
    "Work through past questions every day, starting with the easiest",
    "Join a study group so classmates can explain difficult topics",
];

const TIER_DEVELOPING: [&str; 4] = [
    "List the topics where you lost marks and revise them first",
    "Practise exercises on a fixed schedule instead of cramming",
    "Ask your teacher about any topic that is still unclear",
    "Redo your continuous assessment questions and compare with the corrections",
];

const TIER_GOOD: [&str; 4] = [
    "Attempt harder practice questions to push into the A band",
    "Work on exam technique and time management under timed conditions",
    "Keep a steady revision timetable through the term",
    "Explain topics to classmates to strengthen your own understanding",
];

const TIER_EXCELLENT: [&str; 4] = [
    "Keep up your current study habits",
    "Try competition and advanced-level questions",
    "Read around the subject beyond the syllabus",
    "Mentor classmates who find this subject difficult",
];

const SUBJECT_RECOMMENDATIONS: &[(&str, [&str; 3])] = &[
    (
        "Mathematics",
        [
            "Solve at least ten problems daily across different topics",
            "Memorise key formulas and practise applying them",
            "Show every step of your working to catch mistakes",
        ],
    ),
    (
        "English Language",
        [
            "Read a novel or newspaper article every day",
            "Write a short essay each week and ask for feedback",
            "Build vocabulary with a personal word list",
        ],
    ),
    (
        "Basic Science",
        [
            "Draw and label diagrams for each topic",
            "Relate scientific concepts to everyday observations",
            "Revise definitions and key terms regularly",
        ],
    ),
    (
        "Basic Technology",
        [
            "Practise technical drawing with correct instruments",
            "Study the properties and uses of common materials",
            "Review workshop safety rules and tools",
        ],
    ),
    (
        "Social Studies",
        [
            "Summarise each chapter in your own words",
            "Follow current events and link them to class topics",
            "Use mind maps to connect related ideas",
        ],
    ),
    (
        "Civic Education",
        [
            "Learn the key rights and duties of citizens",
            "Discuss civic issues with family or classmates",
            "Revise constitutional terms with flash cards",
        ],
    ),
];

const GENERIC_RECOMMENDATIONS: [&str; 3] = [
    "Create a dedicated study schedule for this subject",
    "Review class notes within a day of each lesson",
    "Practise with past examination questions",
];

const DECLINE_RECOMMENDATIONS: [&str; 3] = [
    "Compare this term's scripts with last term's to find what changed",
    "Meet your subject teacher to agree on a recovery plan",
    "Increase weekly study time for this subject until scores recover",
];

fn tier_recommendations(total: f64) -> &'static [&'static str; 4] {
    if total < 50.0 {
        &TIER_STRUGGLING
    } else if total < 65.0 {
        &TIER_DEVELOPING
    } else if total < 80.0 {
        &TIER_GOOD
    } else {
        &TIER_EXCELLENT
    }
}

fn subject_recommendations(subject: &str) -> &'static [&'static str; 3] {
    SUBJECT_RECOMMENDATIONS
        .iter()
        .find(|(name, _)| *name == subject)
        .map(|(_, items)| items)
        .unwrap_or(&GENERIC_RECOMMENDATIONS)
}

/// Tier items, then subject items, then decline items, cut to six.
pub fn generate_recommendations(subject: &str, total: f64, improvement: Option<f64>) -> Vec<String> {
    let declined = improvement.is_some_and(|delta| delta < 0.0);

    tier_recommendations(total)
        .iter()
        .chain(subject_recommendations(subject).iter())
        .chain(DECLINE_RECOMMENDATIONS.iter().filter(|_| declined))
        .take(MAX_RECOMMENDATIONS)
        .map(|s| s.to_string())
        .collect()
}

fn week(label: &str, focus: &str, activities: &[&str], time_commitment: &str) -> StudyPlanWeek {
    StudyPlanWeek {
        week_label: label.to_string(),
        focus: focus.to_string(),
        activities: activities.iter().map(|a| a.to_string()).collect(),
        time_commitment: time_commitment.to_string(),
    }
}

pub fn generate_study_plan(total: f64) -> Vec<StudyPlanWeek> {
    if total < 50.0 {
        vec![
            week(
                "Week 1-2",
                "Foundation building",
                &[
                    "Review basic concepts from the start of the term",
                    "Complete simple practice exercises daily",
                    "Attend extra lessons or tutorials",
                ],
                "1 hour daily",
            ),
            week(
                "Week 3-4",
                "Guided practice",
                &[
                    "Work through past questions with a tutor",
                    "Take short weekly self-tests",
                    "Track errors in a correction notebook",
                ],
                "1 hour 30 minutes daily",
            ),
        ]
    } else if total < 65.0 {
        vec![
            week(
                "Week 1-2",
                "Closing knowledge gaps",
                &[
                    "Identify weak topics from recent tests",
                    "Revise one weak topic every two days",
                    "Practise mixed exercises",
                ],
                "45 minutes daily",
            ),
            week(
                "Week 3-4",
                "Exam preparation",
                &[
                    "Attempt full past papers under timed conditions",
                    "Review marking schemes",
                    "Discuss difficult questions with classmates",
                ],
                "1 hour daily",
            ),
        ]
    } else {
        vec![
            week(
                "Week 1-2",
                "Consolidation",
                &[
                    "Summarise each topic on one page",
                    "Attempt challenging problems",
                    "Teach a topic to a classmate",
                ],
                "30 minutes daily",
            ),
            week(
                "Week 3-4",
                "Extension",
                &[
                    "Explore advanced material beyond the syllabus",
                    "Enter quizzes or competitions",
                    "Do timed revision of the whole term",
                ],
                "45 minutes daily",
            ),
        ]
    }
}

pub const WEAK_FIRST_CA: &str = "First continuous assessment below 15/20";
pub const WEAK_SECOND_CA: &str = "Second continuous assessment below 15/20";
pub const WEAK_EXAM: &str = "Examination score below 35/60";
pub const WEAK_FIRST_CA_DROP: &str = "First continuous assessment lower than last term";
pub const WEAK_EXAM_DROP: &str = "Examination score lower than last term";

pub fn identify_weak_areas(current: &TermScores, previous: Option<&TermScores>) -> Vec<String> {
    let mut areas = Vec::new();

    if current.first_assessment < 15.0 {
        areas.push(WEAK_FIRST_CA.to_string());
    }
    if current.second_assessment < 15.0 {
        areas.push(WEAK_SECOND_CA.to_string());
    }
    if current.exam_score < 35.0 {
        areas.push(WEAK_EXAM.to_string());
    }
    if let Some(previous) = previous {
        if current.first_assessment < previous.first_assessment {
            areas.push(WEAK_FIRST_CA_DROP.to_string());
        }
        if current.exam_score < previous.exam_score {
            areas.push(WEAK_EXAM_DROP.to_string());
        }
    }

    areas
}

/// Full analysis of the two most recent terms. Never fails: too little
/// data is reported as `InsufficientData`.
pub fn analyze_results(results: &ResultsBySessionAndTerm) -> PerformanceAnalysis {
    let entries = flatten_terms(results);
    let (current, previous) = select_terms(&entries);

    let Some(current) = current else {
        log::debug!("no populated terms, nothing to analyse");
        return PerformanceAnalysis {
            current_term: None,
            previous_term: None,
            overall: OverallAnalysis::insufficient(),
            subjects: BTreeMap::new(),
        };
    };

    log::debug!(
        "analysing {} against {}",
        current.key(),
        previous
            .map(|p| p.key().to_string())
            .unwrap_or_else(|| "nothing".to_string())
    );

    let mut subjects = compare_subjects(current.records, previous.map(|p| p.records));
    let trend = classify_trend(&subjects);
    let mut overall = OverallAnalysis {
        overall_trend: trend.trend,
        current_average: trend.current_average,
        previous_average: trend.previous_average,
        ..OverallAnalysis::insufficient()
    };

    for (name, subject) in subjects.iter_mut() {
        let (Some(current_scores), Some(previous_scores)) =
            (subject.current_term.clone(), subject.previous_term.clone())
        else {
            continue;
        };
        let total = current_scores.total;

        match categorize(total) {
            Category::Strength => overall.strengths.push(name.clone()),
            Category::Weakness => overall.weaknesses.push(name.clone()),
            Category::Concern => overall.concerns.push(name.clone()),
        }
        if subject.improvement.is_some_and(|delta| delta > 0.0) {
            overall.improvements.push(name.clone());
        }

        subject.recommendations = generate_recommendations(name, total, subject.improvement);
        subject.study_plan = generate_study_plan(total);
        subject.weak_areas = identify_weak_areas(&current_scores, Some(&previous_scores));
    }

    log::debug!("overall trend: {}", overall.overall_trend.label());

    PerformanceAnalysis {
        current_term: Some(current.key()),
        previous_term: previous.map(|p| p.key()),
        overall,
        subjects,
    }
}
