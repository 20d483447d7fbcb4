use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";

/// One subject's scores for one term, already coerced to numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub subject_name: String,
    pub first_assessment: f64,
    pub second_assessment: f64,
    pub exam_score: f64,
}

impl ScoreRecord {
    pub fn new(
        subject_name: impl Into<String>,
        first_assessment: f64,
        second_assessment: f64,
        exam_score: f64,
    ) -> Self {
        Self {
            subject_name: subject_name.into(),
            first_assessment,
            second_assessment,
            exam_score,
        }
    }

    pub fn total(&self) -> f64 {
        self.first_assessment + self.second_assessment + self.exam_score
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubject {
    #[serde(default)]
    pub name: Option<String>,
}

/// Result row as the backend sends it. Score fields may be numbers,
/// strings, null or missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScoreRecord {
    #[serde(default)]
    pub subject: Option<RawSubject>,
    #[serde(default)]
    pub first_ca: serde_json::Value,
    #[serde(default)]
    pub second_ca: serde_json::Value,
    #[serde(default)]
    pub exam_score: serde_json::Value,
}

pub type ResultsBySessionAndTerm = BTreeMap<String, BTreeMap<String, Vec<ScoreRecord>>>;
pub type RawResults = BTreeMap<String, BTreeMap<String, Vec<RawScoreRecord>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermKey {
    pub session: String,
    pub term: String,
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.session, self.term)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermScores {
    pub total: f64,
    pub grade: Grade,
    pub first_assessment: f64,
    pub second_assessment: f64,
    pub exam_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanWeek {
    pub week_label: String,
    pub focus: String,
    pub activities: Vec<String>,
    pub time_commitment: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAnalysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_term: Option<TermScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_term: Option<TermScores>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement: Option<f64>,
    pub recommendations: Vec<String>,
    pub study_plan: Vec<StudyPlanWeek>,
    pub weak_areas: Vec<String>,
}

impl SubjectAnalysis {
    /// Both terms present, which is what makes a subject eligible for
    /// categorization and plan generation.
    pub fn is_comparable(&self) -> bool {
        self.current_term.is_some() && self.previous_term.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallTrend {
    SignificantImprovement,
    ModerateImprovement,
    Stable,
    Declining,
    InsufficientData,
}

impl OverallTrend {
    pub fn label(&self) -> &'static str {
        match self {
            OverallTrend::SignificantImprovement => "significant improvement",
            OverallTrend::ModerateImprovement => "moderate improvement",
            OverallTrend::Stable => "stable",
            OverallTrend::Declining => "declining",
            OverallTrend::InsufficientData => "insufficient data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAnalysis {
    pub overall_trend: OverallTrend,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub concerns: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_average: Option<f64>,
}

impl OverallAnalysis {
    pub fn insufficient() -> Self {
        Self {
            overall_trend: OverallTrend::InsufficientData,
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            concerns: Vec::new(),
            improvements: Vec::new(),
            current_average: None,
            previous_average: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub current_term: Option<TermKey>,
    pub previous_term: Option<TermKey>,
    pub overall: OverallAnalysis,
    pub subjects: BTreeMap<String, SubjectAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub admission_number: String,
    pub full_name: String,
    pub class_name: String,
}
