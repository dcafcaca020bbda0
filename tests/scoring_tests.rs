use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use smart_todo::models::{Difficulty, Energy, Mood, Priority, Status, Task};
use smart_todo::scoring::{compare, rank, score, score_task, urgency, Scored, MAX_URGENCY, NEUTRAL_URGENCY};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(9, 30, 0).unwrap()
}

fn task(title: &str, deadline: Option<NaiveDateTime>, priority: Priority, mood: Mood) -> Task {
    Task::new(title, deadline, priority, mood)
}

#[test]
fn test_completed_tasks_are_not_scored() {
    let mut t = task("Done", Some(now()), Priority::Critical, Mood::Focused);
    t.status = Status::Completed;
    assert_eq!(score(&t, now(), Mood::Focused), None);
    let tasks = vec![t];
    assert!(rank(&tasks, now(), Mood::Focused).is_empty());
}

#[test]
fn test_urgency_is_monotonic_towards_the_deadline() {
    let deadline = now() + Duration::days(10);
    let mut previous = 0.0;
    for hours_before in (0..=240).rev().step_by(6) {
        let at = deadline - Duration::hours(hours_before);
        let u = urgency(Some(deadline), at);
        assert!(u >= previous, "urgency dropped {hours_before}h before the deadline");
        previous = u;
    }
    assert_eq!(urgency(Some(deadline), deadline + Duration::hours(3)), MAX_URGENCY);
    assert_eq!(urgency(None, now()), NEUTRAL_URGENCY);
}

#[test]
fn test_overdue_gets_maximum_urgency() {
    let overdue = task("Late", Some(now() - Duration::days(2)), Priority::Low, Mood::Any);
    let soon = task("Soon", Some(now() + Duration::minutes(5)), Priority::Low, Mood::Any);
    assert!(score(&overdue, now(), Mood::Any).unwrap() >= score(&soon, now(), Mood::Any).unwrap());
}

#[test]
fn test_priority_is_strictly_ordered() {
    let deadline = Some(now() + Duration::days(3));
    for mood in Mood::CURRENT {
        let scores: Vec<f64> = Priority::ALL
            .iter()
            .map(|p| score(&task("T", deadline, *p, Mood::Relaxed), now(), mood).unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] < w[1]), "{mood}: {scores:?}");
    }
}

#[test]
fn test_mood_exact_beats_any_beats_mismatch() {
    let deadline = Some(now() + Duration::days(1));
    for current in Mood::CURRENT {
        let other = current.next_current();
        let exact = score(&task("T", deadline, Priority::Medium, current), now(), current).unwrap();
        let any = score(&task("T", deadline, Priority::Medium, Mood::Any), now(), current).unwrap();
        let mismatch = score(&task("T", deadline, Priority::Medium, other), now(), current).unwrap();
        assert!(exact >= any && any >= mismatch, "{current}: {exact} {any} {mismatch}");
        assert!(mismatch > 0.0);
    }
}

#[test]
fn test_tired_prefers_light_tasks() {
    let deadline = Some(now() + Duration::days(2));
    let mut heavy = task("Heavy", deadline, Priority::Medium, Mood::Any);
    heavy.energy = Energy::High;
    heavy.difficulty = Difficulty::Hard;
    let mut light = task("Light", deadline, Priority::Medium, Mood::Any);
    light.energy = Energy::Low;
    light.difficulty = Difficulty::Easy;

    let tasks = vec![heavy, light];
    let tired = rank(&tasks, now(), Mood::Tired);
    assert_eq!(tired[0].task.title, "Light");
    let energetic = rank(&tasks, now(), Mood::Energetic);
    assert_eq!(energetic[0].task.title, "Heavy");
}

#[test]
fn test_equal_tasks_keep_store_order() {
    let d = now() + Duration::days(1);
    let a = task("A", Some(d), Priority::High, Mood::Any);
    let b = task("B", Some(d), Priority::High, Mood::Any);

    let forward = vec![a.clone(), b.clone()];
    let ranked = rank(&forward, now(), Mood::Focused);
    let titles: Vec<&str> = ranked.iter().map(|s| s.task.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);

    let backward = vec![b, a];
    let ranked = rank(&backward, now(), Mood::Focused);
    let titles: Vec<&str> = ranked.iter().map(|s| s.task.title.as_str()).collect();
    assert_eq!(titles, ["B", "A"]);
}

#[test]
fn test_equal_scores_break_by_deadline_then_priority() {
    let d = now() + Duration::days(1);
    let early = task("Early", Some(d), Priority::Low, Mood::Any);
    let late = task("Late", Some(d + Duration::hours(1)), Priority::Critical, Mood::Any);
    let open = task("Open", None, Priority::Critical, Mood::Any);
    let high = task("High", Some(d), Priority::High, Mood::Any);
    let breakdown = score_task(&early, now(), Mood::Any).unwrap();
    let scored = |index, task| Scored { index, task, breakdown };

    assert_eq!(compare(&scored(1, &early), &scored(0, &late)), Ordering::Less);
    assert_eq!(compare(&scored(0, &open), &scored(1, &late)), Ordering::Greater);
    assert_eq!(compare(&scored(1, &high), &scored(0, &early)), Ordering::Less);
}
