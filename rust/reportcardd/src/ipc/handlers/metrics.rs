use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str_list, optional_usize, record};
use crate::ipc::types::{AppState, Request};
use crate::metrics::{self, SortKey};
use crate::model::League;
use serde_json::{json, Value};

const DEFAULT_RANKED: usize = 3;
/// Subjects charted when the caller names none.
const DEFAULT_COMPARED: usize = 4;

fn handle_subjects_top(state: &mut AppState, req: &Request) -> Value {
    let n = match optional_usize(req, "n", DEFAULT_RANKED) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match record(state, req) {
        Ok(r) => ok(&req.id, json!({ "subjects": metrics::top_subjects(&r.subjects, n) })),
        Err(e) => e,
    }
}

fn handle_subjects_weakest(state: &mut AppState, req: &Request) -> Value {
    let n = match optional_usize(req, "n", DEFAULT_RANKED) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match record(state, req) {
        Ok(r) => ok(&req.id, json!({ "subjects": metrics::weakest_subjects(&r.subjects, n) })),
        Err(e) => e,
    }
}

fn handle_subjects_sorted(state: &mut AppState, req: &Request) -> Value {
    let by = req.params.get("by").and_then(|v| v.as_str()).unwrap_or("taz");
    let Some(key) = SortKey::parse(by) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown sort key: {}", by),
            Some(json!({ "allowed": ["taz", "improvement"] })),
        );
    };
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let rows: Vec<Value> = metrics::sort_subjects(&r.subjects, key)
        .into_iter()
        .map(|s| {
            json!({
                "name": s.name,
                "taz": s.taz,
                "improvement": metrics::subject_improvement(s),
                "statusEmoji": s.status_emoji,
                "vsAverage": s.vs_average,
                "rank": s.rank,
            })
        })
        .collect();
    ok(&req.id, json!({ "by": by, "subjects": rows }))
}

fn handle_subjects_accuracy(state: &mut AppState, req: &Request) -> Value {
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let only = req.params.get("subject").and_then(|v| v.as_str());
    if let Some(name) = only {
        if r.subject(name).is_none() {
            return err(&req.id, "not_found", format!("unknown subject: {}", name), None);
        }
    }
    let mut scored: Vec<_> = r
        .subjects
        .iter()
        .filter(|s| only.map_or(true, |name| s.name == name))
        .map(|s| (s, metrics::accuracy_percentage(s)))
        .collect();
    // Best first; ties keep record order.
    scored.sort_by_key(|&(_, pct)| std::cmp::Reverse(pct));
    let rows: Vec<Value> = scored
        .into_iter()
        .map(|(s, pct)| {
            json!({
                "name": s.name,
                "correct": s.correct,
                "wrong": s.wrong,
                "blank": s.blank,
                "accuracy": pct,
                "tier": metrics::accuracy_tier(pct),
                "percentWithNegative": s.percent_with_negative,
                "percentWithoutNegative": s.percent_without_negative,
                "tazIfNoWrong": s.taz_if_no_wrong,
            })
        })
        .collect();
    ok(&req.id, json!({ "subjects": rows }))
}

fn handle_subjects_series(state: &mut AppState, req: &Request) -> Value {
    let selected = match optional_str_list(req, "subjects") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let selected = selected.unwrap_or_else(|| {
        r.subjects
            .iter()
            .take(DEFAULT_COMPARED)
            .map(|s| s.name.clone())
            .collect()
    });
    ok(
        &req.id,
        json!({
            "subjects": selected,
            "points": metrics::subject_time_series(&r.subjects, &r.exams, &selected),
        }),
    )
}

fn handle_exams_progress(state: &mut AppState, req: &Request) -> Value {
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let improvements = metrics::exam_improvements(&r.exams);
    ok(
        &req.id,
        json!({
            "completedExams": r.completed_exams().len(),
            "improvements": improvements,
            "totalImprovement": metrics::total_improvement(&r.exams),
            "averageImprovement": metrics::average_improvement(&improvements),
            "trend": metrics::trend_direction(&r.exams),
        }),
    )
}

fn handle_exams_roadmap(state: &mut AppState, req: &Request) -> Value {
    match record(state, req) {
        Ok(r) => ok(&req.id, json!({ "nodes": metrics::roadmap(&r.exams) })),
        Err(e) => e,
    }
}

fn handle_exams_trend(state: &mut AppState, req: &Request) -> Value {
    match record(state, req) {
        Ok(r) => ok(
            &req.id,
            json!({ "points": metrics::exam_trend(&r.exams, r.average_taz) }),
        ),
        Err(e) => e,
    }
}

fn handle_league(state: &mut AppState, req: &Request) -> Value {
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let board: Vec<Value> = League::ALL
        .iter()
        .map(|l| {
            json!({
                "league": l,
                "emoji": l.emoji(),
                "threshold": l.next_threshold(),
                "current": *l == r.league,
            })
        })
        .collect();
    ok(
        &req.id,
        json!({
            "progress": metrics::league_progress(r.league, r.total_taz),
            "emoji": r.league.emoji(),
            "totalTaz": r.total_taz,
            "board": board,
        }),
    )
}

fn handle_skill_tree(state: &mut AppState, req: &Request) -> Value {
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let subjects: Vec<Value> = r
        .subjects
        .iter()
        .filter_map(|s| s.skill_tree.as_ref().map(|tree| (s, tree)))
        .map(|(s, tree)| {
            let mastery = metrics::average_mastery(tree);
            json!({
                "name": s.name,
                "averageMastery": mastery,
                "tier": metrics::mastery_tier(mastery),
                "tree": tree,
            })
        })
        .collect();
    ok(&req.id, json!({ "subjects": subjects }))
}

fn handle_summary(state: &mut AppState, req: &Request) -> Value {
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "name": r.name,
            "status": r.status,
            "statusEmoji": r.status_emoji,
            "totalTaz": r.total_taz,
            "averageTaz": r.average_taz,
            "profileDelta": metrics::profile_delta(r.total_taz, r.average_taz),
            "rank": r.rank,
            "totalParticipants": r.total_participants,
            "absenceCount": r.absence_count,
            "completedExams": r.completed_exams().len(),
            "answers": metrics::answer_totals(&r.subjects),
            "recordedAnswers": {
                "correct": r.total_correct,
                "wrong": r.total_wrong,
                "blank": r.total_blank,
            },
            "topSubjects": metrics::top_subjects(&r.subjects, DEFAULT_RANKED)
                .iter()
                .map(|s| &s.name)
                .collect::<Vec<_>>(),
            "weakestSubjects": metrics::weakest_subjects(&r.subjects, DEFAULT_RANKED)
                .iter()
                .map(|s| &s.name)
                .collect::<Vec<_>>(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "metrics.subjects.top" => Some(handle_subjects_top(state, req)),
        "metrics.subjects.weakest" => Some(handle_subjects_weakest(state, req)),
        "metrics.subjects.sorted" => Some(handle_subjects_sorted(state, req)),
        "metrics.subjects.accuracy" => Some(handle_subjects_accuracy(state, req)),
        "metrics.subjects.series" => Some(handle_subjects_series(state, req)),
        "metrics.exams.progress" => Some(handle_exams_progress(state, req)),
        "metrics.exams.roadmap" => Some(handle_exams_roadmap(state, req)),
        "metrics.exams.trend" => Some(handle_exams_trend(state, req)),
        "metrics.league" => Some(handle_league(state, req)),
        "metrics.skillTree" => Some(handle_skill_tree(state, req)),
        "metrics.summary" => Some(handle_summary(state, req)),
        _ => None,
    }
}
