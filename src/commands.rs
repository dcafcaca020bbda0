use std::io::{BufRead, Write};

use chrono::NaiveDateTime;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tracing::{debug, info};

use crate::advisor::RankingAdvisor;
use crate::error::TodoError;
use crate::models::{Mood, Priority, Status, Task};
use crate::prompt::{complete_draft, Prompter, TaskDraft};
use crate::scoring::{self, Scored};
use crate::storage::{FeedbackEntry, FeedbackLog, TaskStore};
use crate::suggest::{humanize, suggest, RankingSource, SuggestionResult};

/// Adds a new task, prompting for every field the draft leaves out.
///
/// Deadlines already in the past are accepted with a warning.
pub fn cmd_add<S, R, W>(
    store: &mut S,
    draft: TaskDraft,
    prompter: &mut Prompter<R, W>,
    now: NaiveDateTime,
    use_defaults: bool,
    silent: bool,
) -> Result<Task, TodoError>
where
    S: TaskStore,
    R: BufRead,
    W: Write,
{
    let existing = store.load_all()?;
    let (task, deadline) = complete_draft(draft, prompter, &existing, now, use_defaults)?;
    store.insert(existing, task.clone())?;
    info!(title = %task.title, "task added");

    if !silent {
        if deadline.past {
            println!("Warning: the deadline {} is already in the past.", task.deadline_label());
        }
        println!("Task added successfully!");
        println!("\nTask details:");
        let mut table = base_table(&["Title", "Description", "Deadline", "Priority", "Mood", "Effort", "Difficulty", "Energy"]);
        table.add_row(vec![
            Cell::new(&task.title),
            Cell::new(&task.description),
            Cell::new(task.deadline_label()),
            priority_cell(task.priority),
            Cell::new(mood_label(task.mood)),
            Cell::new(task.effort),
            Cell::new(task.difficulty),
            Cell::new(task.energy),
        ]);
        println!("{table}");
    }
    Ok(task)
}

/// Lists tasks, best candidates first. Completed tasks are hidden unless `all` is set,
/// in which case they follow the open ones in store order.
pub fn cmd_list<S: TaskStore>(store: &S, all: bool, now: NaiveDateTime) -> Result<(), TodoError> {
    let tasks = store.load_all()?;
    let ranked = scoring::rank(&tasks, now, Mood::Any);
    let completed: Vec<&Task> = if all {
        tasks.iter().filter(|t| t.is_completed()).collect()
    } else {
        Vec::new()
    };
    if ranked.is_empty() && completed.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = base_table(&["Title", "Description", "Deadline", "Time Left", "Priority", "Mood", "Status", "Effort", "Energy", "Score"]);
    for Scored { task, breakdown, .. } in &ranked {
        table.add_row(task_row(task, now, Some(breakdown.total)));
    }
    for task in completed {
        table.add_row(task_row(task, now, None));
    }
    println!("{table}");
    Ok(())
}

/// Moves a task to a new status. Only forward moves are allowed.
pub fn cmd_status<S: TaskStore>(store: &mut S, title: &str, status: Status, silent: bool) -> Result<Task, TodoError> {
    let task = store.update_status(title, status)?;
    info!(title, status = %status, "status updated");
    if !silent {
        println!("Task '{}' status updated to '{}'!", title, status);
    }
    Ok(task)
}

pub fn cmd_complete<S: TaskStore>(store: &mut S, title: &str, silent: bool) -> Result<Task, TodoError> {
    let task = store.update_status(title, Status::Completed)?;
    info!(title, "task completed");
    if !silent {
        println!("Task '{}' marked as completed!", title);
    }
    Ok(task)
}

/// Options of the `suggest` command.
#[derive(Debug, Clone, Default)]
pub struct SuggestOptions {
    /// Asked for when missing.
    pub mood: Option<Mood>,
    /// Rows to show; `None` shows every candidate.
    pub limit: Option<usize>,
    pub ask_feedback: bool,
    /// Candidates sent to the ranking service.
    pub top_k: usize,
}

/// Suggests what to work on and returns the suggested titles, best first.
pub fn cmd_suggest<S, R, W>(
    store: &S,
    feedback: &FeedbackLog,
    advisor: Option<&dyn RankingAdvisor>,
    options: &SuggestOptions,
    prompter: &mut Prompter<R, W>,
    now: NaiveDateTime,
    silent: bool,
) -> Result<Vec<String>, TodoError>
where
    S: TaskStore,
    R: BufRead,
    W: Write,
{
    let tasks = store.load_all()?;
    let mood = match options.mood {
        Some(m) => m,
        None => prompter.choose_labeled("How are you feeling right now?", &Mood::CURRENT, Mood::Focused, |m| {
            format!("{} {}", m, m.icon())
        })?,
    };

    let suggestions = suggest(&tasks, mood, now, advisor, options.top_k);
    debug!(source = ?suggestions.source, count = suggestions.results.len(), "ranked suggestions");
    let shown: Vec<&SuggestionResult> = match options.limit {
        Some(n) => suggestions.results.iter().take(n).collect(),
        None => suggestions.results.iter().collect(),
    };
    let titles: Vec<String> = shown.iter().map(|r| r.task.title.clone()).collect();

    let Some(top) = shown.first() else {
        if !silent {
            println!("No suitable tasks found for your current mood.");
        }
        return Ok(titles);
    };

    if !silent {
        println!("\nBased on your current mood ({}) and priorities, I suggest:", mood);
        if let (RankingSource::Advisor, Some(note)) = (suggestions.source, &suggestions.advisor_note) {
            println!("\nAI: {}", note);
        }
        let mut table = base_table(&["#", "Title", "Deadline", "Priority", "Effort", "Energy", "Status", "Score", "Why"]);
        for (i, r) in shown.iter().enumerate() {
            let t = r.task;
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&t.title).add_attribute(Attribute::Bold),
                Cell::new(t.deadline_label()),
                priority_cell(t.priority),
                Cell::new(t.effort),
                Cell::new(t.energy),
                status_cell(t.status),
                Cell::new(format!("{:.1}", r.score)),
                Cell::new(&r.rationale),
            ]);
        }
        println!("{table}");
    }

    if options.ask_feedback {
        let accepted = prompter.confirm("Was this suggestion helpful?", true)?;
        feedback.append(&FeedbackEntry {
            title: top.task.title.clone(),
            suggested_at: now,
            accepted,
        })?;
        if !silent {
            if accepted {
                println!("Thanks for your feedback!");
            } else {
                println!("I'll try to provide better suggestions next time.");
            }
        }
    }
    Ok(titles)
}

fn base_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Magenta))
                .collect::<Vec<_>>(),
        );
    table
}

fn task_row(t: &Task, now: NaiveDateTime, score: Option<f64>) -> Vec<Cell> {
    let (time_left, overdue) = match t.deadline {
        None => ("-".to_string(), false),
        Some(d) if d <= now => (format!("{} overdue", humanize(now - d)), true),
        Some(d) => (humanize(d - now), false),
    };
    vec![
        Cell::new(&t.title),
        Cell::new(&t.description),
        Cell::new(t.deadline_label()),
        Cell::new(time_left).fg(if overdue && !t.is_completed() { Color::Red } else { Color::Reset }),
        priority_cell(t.priority),
        Cell::new(mood_label(t.mood)),
        status_cell(t.status),
        Cell::new(t.effort),
        Cell::new(t.energy),
        Cell::new(score.map(|s| format!("{:.1}", s)).unwrap_or_else(|| "-".to_string())),
    ]
}

fn mood_label(mood: Mood) -> String {
    format!("{} {}", mood.icon(), mood)
}

fn priority_cell(p: Priority) -> Cell {
    let cell = Cell::new(format!("{} {}", p.level(), p));
    match p {
        Priority::Low => cell.fg(Color::Blue),
        Priority::Medium => cell.fg(Color::Yellow),
        Priority::High => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        Priority::Critical => cell
            .fg(Color::Red)
            .add_attribute(Attribute::Bold)
            .add_attribute(Attribute::Reverse),
    }
}

fn status_cell(s: Status) -> Cell {
    let cell = Cell::new(s);
    match s {
        Status::NotStarted => cell.fg(Color::Yellow),
        Status::InProgress => cell.fg(Color::Blue).add_attribute(Attribute::Bold),
        Status::Completed => cell.fg(Color::Green),
    }
}
