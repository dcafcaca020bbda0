use std::collections::HashSet;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, warn};

use crate::advisor::{CandidateSummary, RankingAdvisor, RankingRequest};
use crate::error::AdvisorError;
use crate::models::{Mood, Task};
use crate::scoring::{self, MoodFit, ScoreBreakdown, Scored};

/// One ranked recommendation.
#[derive(Debug, Clone)]
pub struct SuggestionResult<'a> {
    pub task: &'a Task,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Which factors drove the score, derived from the same inputs.
    pub rationale: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingSource {
    Local,
    /// The ranking service's order was adopted for the top candidates.
    Advisor,
}

#[derive(Debug, Clone)]
pub struct Suggestions<'a> {
    pub results: Vec<SuggestionResult<'a>>,
    pub source: RankingSource,
    /// Free-text reason from the ranking service, when its order was used.
    pub advisor_note: Option<String>,
}

/// Ranks open tasks using only the local heuristic.
pub fn suggest_local<'a>(tasks: &'a [Task], mood: Mood, now: NaiveDateTime) -> Vec<SuggestionResult<'a>> {
    scoring::rank(tasks, now, mood)
        .into_iter()
        .map(|s| into_result(s, mood, now))
        .collect()
}

/// Ranks open tasks, letting `advisor` reorder the best `top_k` of them.
///
/// Any advisor failure or unusable answer leaves the local order untouched.
pub fn suggest<'a>(
    tasks: &'a [Task],
    mood: Mood,
    now: NaiveDateTime,
    advisor: Option<&dyn RankingAdvisor>,
    top_k: usize,
) -> Suggestions<'a> {
    let local = suggest_local(tasks, mood, now);
    let Some(advisor) = advisor else {
        return Suggestions {
            results: local,
            source: RankingSource::Local,
            advisor_note: None,
        };
    };
    if local.is_empty() {
        return Suggestions {
            results: local,
            source: RankingSource::Local,
            advisor_note: None,
        };
    }

    let k = top_k.max(1).min(local.len());
    let request = RankingRequest {
        mood,
        now,
        candidates: local[..k].iter().map(|r| summarize(r, now)).collect(),
    };

    let outcome = advisor.rank(&request).and_then(|resp| {
        let order = reorder_indices(&local[..k], &resp.ranking)?;
        Ok((order, resp.reason))
    });

    match outcome {
        Ok((order, reason)) => {
            debug!(?order, "adopting ranking service order");
            let mut slots: Vec<Option<SuggestionResult<'a>>> = local.into_iter().map(Some).collect();
            let results = order
                .into_iter()
                .chain(k..slots.len())
                .filter_map(|i| slots[i].take())
                .collect();
            Suggestions {
                results,
                source: RankingSource::Advisor,
                advisor_note: reason.filter(|r| !r.trim().is_empty()),
            }
        }
        Err(e) => {
            warn!("AI suggestion failed, using local ranking: {e}");
            Suggestions {
                results: local,
                source: RankingSource::Local,
                advisor_note: None,
            }
        }
    }
}

/// Turns the advisor's title list into an index order over `candidates`.
///
/// Titles named by the advisor come first in its order; candidates it left out keep their
/// local order after them.
fn reorder_indices(candidates: &[SuggestionResult], ranking: &[String]) -> Result<Vec<usize>, AdvisorError> {
    if ranking.is_empty() {
        return Err(AdvisorError::Malformed("empty ranking".to_string()));
    }
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(candidates.len());
    for title in ranking {
        let idx = candidates
            .iter()
            .position(|c| c.task.title == *title)
            .ok_or_else(|| AdvisorError::Malformed(format!("unknown task '{title}'")))?;
        if !seen.insert(idx) {
            return Err(AdvisorError::Malformed(format!("task '{title}' ranked twice")));
        }
        order.push(idx);
    }
    order.extend((0..candidates.len()).filter(|i| !seen.contains(i)));
    Ok(order)
}

fn summarize(result: &SuggestionResult, now: NaiveDateTime) -> CandidateSummary {
    let t = result.task;
    CandidateSummary {
        title: t.title.clone(),
        description: t.description.clone(),
        hours_until_deadline: t
            .deadline
            .map(|d| ((d - now).num_minutes() as f64 / 60.0 * 10.0).round() / 10.0),
        score: (result.score * 10.0).round() / 10.0,
        priority: t.priority,
        mood_required: t.mood,
        effort: t.effort,
        difficulty: t.difficulty,
        energy_required: t.energy,
        status: t.status,
    }
}

fn into_result<'a>(scored: Scored<'a>, mood: Mood, now: NaiveDateTime) -> SuggestionResult<'a> {
    SuggestionResult {
        task: scored.task,
        score: scored.breakdown.total,
        breakdown: scored.breakdown,
        rationale: rationale(scored.task, &scored.breakdown, mood, now),
    }
}

/// Short human form of a span: `45m`, `5h`, `3d`.
pub fn humanize(span: Duration) -> String {
    let minutes = span.num_minutes().abs();
    if minutes < 60 {
        format!("{}m", minutes)
    } else if minutes < 48 * 60 {
        format!("{}h", minutes / 60)
    } else {
        format!("{}d", minutes / (24 * 60))
    }
}

/// Explains a score by listing its components, largest contribution first.
pub fn rationale(task: &Task, b: &ScoreBreakdown, mood: Mood, now: NaiveDateTime) -> String {
    let deadline = match task.deadline {
        None => "no deadline".to_string(),
        Some(d) if d <= now => format!("overdue by {}", humanize(now - d)),
        Some(d) => format!("due in {}", humanize(d - now)),
    };
    let mood_text = match b.mood_fit {
        MoodFit::Exact => format!("matches your {} mood", mood),
        MoodFit::Partial => "fits any mood".to_string(),
        MoodFit::Mismatch => format!("best done {}", task.mood),
    };
    let work = format!(
        "{} energy, {} work",
        task.energy.to_string().to_lowercase(),
        task.difficulty.to_string().to_lowercase()
    );
    let energy_text = if b.alignment > 1.0 {
        format!("{} suits feeling {}", work, mood)
    } else {
        match mood {
            Mood::Energetic | Mood::Focused => format!("{} is too light for feeling {}", work, mood),
            Mood::Relaxed | Mood::Tired => format!("{} is too heavy for feeling {}", work, mood),
            Mood::Creative | Mood::Any => format!("{} does not suit feeling {}", work, mood),
        }
    };

    // (weight, may lead, kind, text); the no-deadline baseline never leads
    let mut factors = vec![
        (b.urgency, task.deadline.is_some(), "deadline proximity", deadline),
        (b.mood_points(), true, "mood match", mood_text),
        (b.priority, true, "priority", format!("{} priority", task.priority)),
    ];
    if (b.alignment - 1.0).abs() >= 1e-9 {
        factors.push((b.alignment_points().abs(), true, "energy fit", energy_text));
    }
    factors.sort_by(|x, y| y.0.total_cmp(&x.0));
    let lead = factors.iter().position(|f| f.1).unwrap_or(0);
    let (_, _, kind, text) = factors.remove(lead);

    let rest: Vec<&str> = factors
        .iter()
        .filter(|(weight, _, _, _)| *weight > 0.0)
        .map(|(_, _, _, text)| text.as_str())
        .collect();
    if rest.is_empty() {
        format!("Mostly {}: {}.", kind, text)
    } else {
        format!("Mostly {}: {}. Also {}.", kind, text, rest.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn humanize_picks_a_unit() {
        assert_eq!(humanize(Duration::minutes(45)), "45m");
        assert_eq!(humanize(Duration::hours(5)), "5h");
        assert_eq!(humanize(Duration::days(3)), "3d");
    }

    #[test]
    fn rationale_leads_with_the_dominant_factor() {
        let task = Task::new("Ship", Some(now() - Duration::hours(2)), Priority::Low, Mood::Tired);
        let b = scoring::score_task(&task, now(), Mood::Focused).unwrap();
        let text = rationale(&task, &b, Mood::Focused, now());
        assert!(text.starts_with("Mostly deadline proximity: overdue by 2h."), "{text}");
    }

    #[test]
    fn reorder_rejects_unknown_and_duplicate_titles() {
        let tasks = vec![
            Task::new("A", None, Priority::Low, Mood::Any),
            Task::new("B", None, Priority::High, Mood::Any),
        ];
        let local = suggest_local(&tasks, Mood::Focused, now());
        assert!(reorder_indices(&local, &["C".to_string()]).is_err());
        assert!(reorder_indices(&local, &["A".to_string(), "A".to_string()]).is_err());
        assert!(reorder_indices(&local, &[]).is_err());
        // B scores higher locally; advisor promotes A
        assert_eq!(reorder_indices(&local, &["A".to_string()]).unwrap(), vec![1, 0]);
    }
}
