//! Local suggestion heuristic.
//!
//! A task's score is `(urgency + priority + mood fit) * alignment`:
//!
//! | component | range | notes |
//! |-----------|-------|-------|
//! | urgency   | 0..=100 | `100 / (1 + hours_left / 24)`, 100 when overdue, 30 without a deadline |
//! | priority  | 0, 10, 20, 30 | Low, Medium, High, Critical |
//! | mood fit  | 40, 24, 8 | exact match, task mood `any`, mismatch |
//! | alignment | 0.7..=1.3 | mood x energy x difficulty table |
//!
//! Only the orderings are meant to be stable: earlier deadlines, higher priorities and
//! better mood fits never lower a score. The constants may be tuned.

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::models::{Difficulty, Energy, Mood, Priority, Task};

pub const MAX_URGENCY: f64 = 100.0;
pub const NEUTRAL_URGENCY: f64 = 30.0;
/// Hours over which urgency halves from its maximum.
const URGENCY_HALF_LIFE_HOURS: f64 = 24.0;

pub const MOOD_WEIGHT: f64 = 40.0;
const EXACT_FIT: f64 = 1.0;
const PARTIAL_FIT: f64 = 0.6;
const MISMATCH_FIT: f64 = 0.2;

const MIN_ALIGNMENT: f64 = 0.7;
const MAX_ALIGNMENT: f64 = 1.3;

/// How well a task's mood matches the user's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodFit {
    Exact,
    /// Either side is `any`.
    Partial,
    Mismatch,
}

impl MoodFit {
    pub fn between(task: Mood, current: Mood) -> MoodFit {
        if task == current {
            MoodFit::Exact
        } else if task == Mood::Any || current == Mood::Any {
            MoodFit::Partial
        } else {
            MoodFit::Mismatch
        }
    }

    pub fn points(self) -> f64 {
        let fit = match self {
            MoodFit::Exact => EXACT_FIT,
            MoodFit::Partial => PARTIAL_FIT,
            MoodFit::Mismatch => MISMATCH_FIT,
        };
        fit * MOOD_WEIGHT
    }
}

/// Urgency from time left until the deadline. Never decreases as `now` approaches it.
pub fn urgency(deadline: Option<NaiveDateTime>, now: NaiveDateTime) -> f64 {
    let Some(deadline) = deadline else {
        return NEUTRAL_URGENCY;
    };
    let hours_left = (deadline - now).num_seconds() as f64 / 3600.0;
    if hours_left <= 0.0 {
        MAX_URGENCY
    } else {
        MAX_URGENCY / (1.0 + hours_left / URGENCY_HALF_LIFE_HOURS)
    }
}

pub fn priority_points(priority: Priority) -> f64 {
    match priority {
        Priority::Low => 0.0,
        Priority::Medium => 10.0,
        Priority::High => 20.0,
        Priority::Critical => 30.0,
    }
}

fn energy_adjustment(mood: Mood, energy: Energy) -> f64 {
    use Energy::*;
    match (mood, energy) {
        (Mood::Energetic, High) => 0.15,
        (Mood::Energetic, Medium) => 0.05,
        (Mood::Energetic, Low) => -0.05,
        (Mood::Focused, High) => 0.05,
        (Mood::Focused, Medium) => 0.05,
        (Mood::Focused, Low) => 0.0,
        (Mood::Creative, High) => 0.0,
        (Mood::Creative, Medium) => 0.05,
        (Mood::Creative, Low) => 0.0,
        (Mood::Relaxed, High) => -0.1,
        (Mood::Relaxed, Medium) => 0.0,
        (Mood::Relaxed, Low) => 0.1,
        (Mood::Tired, High) => -0.2,
        (Mood::Tired, Medium) => -0.05,
        (Mood::Tired, Low) => 0.15,
        (Mood::Any, _) => 0.0,
    }
}

fn difficulty_adjustment(mood: Mood, difficulty: Difficulty) -> f64 {
    use Difficulty::*;
    match (mood, difficulty) {
        (Mood::Energetic, Hard) => 0.1,
        (Mood::Energetic, Medium) => 0.0,
        (Mood::Energetic, Easy) => -0.05,
        (Mood::Focused, Hard) => 0.1,
        (Mood::Focused, Medium) => 0.05,
        (Mood::Focused, Easy) => -0.05,
        (Mood::Creative, Hard) => 0.0,
        (Mood::Creative, Medium) => 0.05,
        (Mood::Creative, Easy) => 0.0,
        (Mood::Relaxed, Hard) => -0.1,
        (Mood::Relaxed, Medium) => 0.0,
        (Mood::Relaxed, Easy) => 0.1,
        (Mood::Tired, Hard) => -0.15,
        (Mood::Tired, Medium) => -0.05,
        (Mood::Tired, Easy) => 0.1,
        (Mood::Any, _) => 0.0,
    }
}

/// Multiplier for how well the task's energy and difficulty suit the current mood.
pub fn alignment(mood: Mood, energy: Energy, difficulty: Difficulty) -> f64 {
    (1.0 + energy_adjustment(mood, energy) + difficulty_adjustment(mood, difficulty))
        .clamp(MIN_ALIGNMENT, MAX_ALIGNMENT)
}

/// The parts a score is built from, kept for explaining the result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub urgency: f64,
    pub priority: f64,
    pub mood_fit: MoodFit,
    pub alignment: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn mood_points(&self) -> f64 {
        self.mood_fit.points()
    }

    /// Points added (or removed) by the alignment multiplier.
    pub fn alignment_points(&self) -> f64 {
        (self.urgency + self.priority + self.mood_points()) * (self.alignment - 1.0)
    }
}

/// Scores a task, or `None` when it is completed and so not a candidate at all.
pub fn score_task(task: &Task, now: NaiveDateTime, mood: Mood) -> Option<ScoreBreakdown> {
    if task.is_completed() {
        return None;
    }
    let urgency = urgency(task.deadline, now);
    let priority = priority_points(task.priority);
    let mood_fit = MoodFit::between(task.mood, mood);
    let alignment = alignment(mood, task.energy, task.difficulty);
    let total = (urgency + priority + mood_fit.points()) * alignment;
    Some(ScoreBreakdown {
        urgency,
        priority,
        mood_fit,
        alignment,
        total,
    })
}

pub fn score(task: &Task, now: NaiveDateTime, mood: Mood) -> Option<f64> {
    score_task(task, now, mood).map(|b| b.total)
}

/// A scored candidate, remembering where it sat in the store.
#[derive(Debug, Clone)]
pub struct Scored<'a> {
    pub index: usize,
    pub task: &'a Task,
    pub breakdown: ScoreBreakdown,
}

/// Highest score first, then earliest deadline (none last), then higher priority, then store order.
pub fn compare(a: &Scored, b: &Scored) -> Ordering {
    b.breakdown
        .total
        .total_cmp(&a.breakdown.total)
        .then_with(|| match (a.task.deadline, b.task.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.task.priority.cmp(&a.task.priority))
        .then_with(|| a.index.cmp(&b.index))
}

/// Scores every open task and sorts them best first.
pub fn rank(tasks: &[Task], now: NaiveDateTime, mood: Mood) -> Vec<Scored<'_>> {
    let mut scored: Vec<Scored> = tasks
        .iter()
        .enumerate()
        .filter_map(|(index, task)| {
            score_task(task, now, mood).map(|breakdown| Scored { index, task, breakdown })
        })
        .collect();
    scored.sort_by(compare);
    scored
}
