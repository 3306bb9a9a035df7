//! Derived metrics over a `StudentRecord`.
//!
//! Every function here is pure: inputs are borrowed, nothing is cached, and
//! empty or singleton inputs produce neutral values (0 or an empty list)
//! instead of errors.

use crate::model::{Exam, League, SkillNode, Subject};
use serde::Serialize;

/// One-decimal rounding used for every displayed percentage delta.
pub fn round_1_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn completed(exams: &[Exam]) -> Vec<&Exam> {
    exams.iter().filter(|e| e.is_completed()).collect()
}

pub fn top_subjects(subjects: &[Subject], n: usize) -> Vec<&Subject> {
    let mut sorted: Vec<&Subject> = subjects.iter().collect();
    sorted.sort_by(|a, b| b.taz.cmp(&a.taz));
    sorted.truncate(n);
    sorted
}

pub fn weakest_subjects(subjects: &[Subject], n: usize) -> Vec<&Subject> {
    let mut sorted: Vec<&Subject> = subjects.iter().collect();
    sorted.sort_by(|a, b| a.taz.cmp(&b.taz));
    sorted.truncate(n);
    sorted
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Taz,
    Improvement,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "taz" => Some(Self::Taz),
            "improvement" => Some(Self::Improvement),
            _ => None,
        }
    }
}

/// Stable descending sort by the chosen key.
pub fn sort_subjects(subjects: &[Subject], key: SortKey) -> Vec<&Subject> {
    let mut sorted: Vec<&Subject> = subjects.iter().collect();
    match key {
        SortKey::Taz => sorted.sort_by(|a, b| b.taz.cmp(&a.taz)),
        SortKey::Improvement => {
            sorted.sort_by(|a, b| subject_improvement(b).cmp(&subject_improvement(a)))
        }
    }
    sorted
}

/// Last history point minus the first.
pub fn subject_improvement(subject: &Subject) -> i64 {
    match (subject.history.first(), subject.history.last()) {
        (Some(first), Some(last)) => last.saturating_sub(*first),
        _ => 0,
    }
}

pub fn accuracy_percentage(subject: &Subject) -> i64 {
    let total = u64::from(subject.correct) + u64::from(subject.wrong) + u64::from(subject.blank);
    if total == 0 {
        return 0;
    }
    (subject.correct as f64 / total as f64 * 100.0).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccuracyTier {
    Excellent,
    Good,
    Fair,
    Weak,
}

pub fn accuracy_tier(percentage: i64) -> AccuracyTier {
    if percentage >= 80 {
        AccuracyTier::Excellent
    } else if percentage >= 60 {
        AccuracyTier::Good
    } else if percentage >= 40 {
        AccuracyTier::Fair
    } else {
        AccuracyTier::Weak
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamImprovement {
    pub exam_name: String,
    pub previous_taz: i64,
    pub current_taz: i64,
    pub improvement: i64,
    pub improvement_percent: f64,
}

pub fn exam_improvements(exams: &[Exam]) -> Vec<ExamImprovement> {
    completed(exams)
        .windows(2)
        .map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            let improvement = current.taz - previous.taz;
            ExamImprovement {
                exam_name: current.name.clone(),
                previous_taz: previous.taz,
                current_taz: current.taz,
                improvement,
                improvement_percent: round_1_decimal(improvement as f64 / previous.taz as f64 * 100.0),
            }
        })
        .collect()
}

pub fn total_improvement(exams: &[Exam]) -> i64 {
    let done = completed(exams);
    match (done.first(), done.last()) {
        (Some(first), Some(last)) if done.len() > 1 => last.taz - first.taz,
        _ => 0,
    }
}

pub fn average_improvement(improvements: &[ExamImprovement]) -> f64 {
    if improvements.is_empty() {
        return 0.0;
    }
    let sum: f64 = improvements.iter().map(|i| i.improvement as f64).sum();
    sum / improvements.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Unknown,
}

/// First versus last completed exam.
pub fn trend_direction(exams: &[Exam]) -> TrendDirection {
    let done = completed(exams);
    match (done.first(), done.last()) {
        (Some(first), Some(last)) if done.len() > 1 => {
            if last.taz > first.taz {
                TrendDirection::Rising
            } else {
                TrendDirection::Falling
            }
        }
        _ => TrendDirection::Unknown,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueProgress {
    pub league: League,
    pub previous_league: Option<League>,
    pub next_league: Option<League>,
    pub threshold: Option<i64>,
    pub progress: f64,
    pub remaining: Option<i64>,
    pub ready_to_advance: bool,
}

pub fn league_progress(league: League, total_taz: i64) -> LeagueProgress {
    let threshold = league.next_threshold();
    let (progress, remaining, ready_to_advance) = match threshold {
        Some(t) => {
            let remaining = t.saturating_sub(total_taz);
            let progress = (total_taz as f64 / t as f64).clamp(0.0, 1.0);
            (progress, Some(remaining.max(0)), remaining <= 0)
        }
        None => (1.0, None, false),
    };
    LeagueProgress {
        league,
        previous_league: league.previous(),
        next_league: league.next(),
        threshold,
        progress,
        remaining,
        ready_to_advance,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesValue {
    pub subject: String,
    pub taz: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub exam_name: String,
    pub values: Vec<SeriesValue>,
}

/// `history[i]` is read as the score of the i-th completed exam. Points
/// outside a subject's history and unknown subject names are left out.
pub fn subject_time_series(
    subjects: &[Subject],
    exams: &[Exam],
    selected: &[String],
) -> Vec<SeriesPoint> {
    completed(exams)
        .into_iter()
        .enumerate()
        .map(|(idx, exam)| SeriesPoint {
            exam_name: exam.name.clone(),
            values: selected
                .iter()
                .filter_map(|name| {
                    let subject = subjects.iter().find(|s| &s.name == name)?;
                    let taz = *subject.history.get(idx)?;
                    Some(SeriesValue {
                        subject: name.clone(),
                        taz,
                    })
                })
                .collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentIssue {
    pub subject: String,
    pub history_len: usize,
    pub completed_exams: usize,
}

pub fn history_alignment(subjects: &[Subject], exams: &[Exam]) -> Vec<AlignmentIssue> {
    let completed_exams = completed(exams).len();
    subjects
        .iter()
        .filter(|s| s.history.len() != completed_exams)
        .map(|s| AlignmentIssue {
            subject: s.name.clone(),
            history_len: s.history.len(),
            completed_exams,
        })
        .collect()
}

/// Mean of the top-level nodes only; children are averaged at their own level.
pub fn average_mastery(tree: &[SkillNode]) -> f64 {
    if tree.is_empty() {
        return 0.0;
    }
    tree.iter().map(|n| n.mastery).sum::<f64>() / tree.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MasteryTier {
    Mastered,
    Proficient,
    Developing,
    NeedsWork,
}

pub fn mastery_tier(mastery: f64) -> MasteryTier {
    if mastery >= 85.0 {
        MasteryTier::Mastered
    } else if mastery >= 70.0 {
        MasteryTier::Proficient
    } else if mastery >= 50.0 {
        MasteryTier::Developing
    } else {
        MasteryTier::NeedsWork
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RoadmapTier {
    Locked,
    Strong,
    Steady,
    Weak,
}

impl RoadmapTier {
    pub fn emoji(self) -> &'static str {
        match self {
            RoadmapTier::Locked => "🔒",
            RoadmapTier::Strong => "🟢",
            RoadmapTier::Steady => "🟡",
            RoadmapTier::Weak => "🔴",
        }
    }
}

pub fn roadmap_tier(taz: i64) -> RoadmapTier {
    if taz <= 0 {
        RoadmapTier::Locked
    } else if taz >= 10000 {
        RoadmapTier::Strong
    } else if taz >= 9000 {
        RoadmapTier::Steady
    } else {
        RoadmapTier::Weak
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapNode {
    pub name: String,
    pub date: String,
    pub taz: i64,
    pub completed: bool,
    pub tier: RoadmapTier,
    pub emoji: &'static str,
    pub change_percent: Option<f64>,
}

pub fn roadmap(exams: &[Exam]) -> Vec<RoadmapNode> {
    exams
        .iter()
        .enumerate()
        .map(|(idx, exam)| {
            let previous = idx.checked_sub(1).and_then(|i| exams.get(i));
            let change_percent = match previous {
                Some(prev) if exam.is_completed() && prev.is_completed() => Some(round_1_decimal(
                    (exam.taz - prev.taz) as f64 / prev.taz as f64 * 100.0,
                )),
                _ => None,
            };
            let tier = roadmap_tier(exam.taz);
            RoadmapNode {
                name: exam.name.clone(),
                date: exam.date.clone(),
                taz: exam.taz,
                completed: exam.is_completed(),
                tier,
                emoji: tier.emoji(),
                change_percent,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub exam_name: String,
    pub taz: i64,
    pub average_taz: i64,
}

pub fn exam_trend(exams: &[Exam], average_taz: i64) -> Vec<TrendPoint> {
    completed(exams)
        .into_iter()
        .map(|e| TrendPoint {
            exam_name: e.name.clone(),
            taz: e.taz,
            average_taz,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerTotals {
    pub correct: u64,
    pub wrong: u64,
    pub blank: u64,
}

pub fn answer_totals(subjects: &[Subject]) -> AnswerTotals {
    subjects.iter().fold(AnswerTotals::default(), |acc, s| AnswerTotals {
        correct: acc.correct + u64::from(s.correct),
        wrong: acc.wrong + u64::from(s.wrong),
        blank: acc.blank + u64::from(s.blank),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDelta {
    pub improvement: i64,
    pub improvement_percent: f64,
}

/// Current total against the running average.
pub fn profile_delta(total_taz: i64, average_taz: i64) -> ProfileDelta {
    let improvement = total_taz.saturating_sub(average_taz);
    let improvement_percent = if average_taz == 0 {
        0.0
    } else {
        round_1_decimal(improvement as f64 / average_taz as f64 * 100.0)
    };
    ProfileDelta {
        improvement,
        improvement_percent,
    }
}
