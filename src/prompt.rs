use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::error::TodoError;
use crate::models::{parse_deadline_str, Difficulty, Effort, Energy, Mood, Priority, Task, DEADLINE_FORMAT};
use crate::storage::validate_new_title;

const MAX_ATTEMPTS: usize = 3;
const END_OF_DAY_HOUR: u32 = 17;

/// Trims and checks a new task title against the existing ones.
pub fn validate_title(input: &str, existing: &[Task]) -> Result<String, TodoError> {
    let title = input.trim();
    validate_new_title(title, existing)?;
    Ok(title.to_string())
}

/// A parsed deadline answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadlineInput {
    pub deadline: Option<NaiveDateTime>,
    /// Set when the deadline is already behind `now`. Accepted, but worth a warning.
    pub past: bool,
}

/// Empty input means "no deadline".
pub fn parse_deadline(input: &str, now: NaiveDateTime) -> Result<DeadlineInput, TodoError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(DeadlineInput {
            deadline: None,
            past: false,
        });
    }
    let deadline = parse_deadline_str(input).ok_or_else(|| {
        TodoError::Validation(format!("Invalid deadline '{}'. Please use format YYYY-MM-DD HH:MM", input))
    })?;
    Ok(DeadlineInput {
        deadline: Some(deadline),
        past: deadline < now,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeadlinePreset {
    pub label: String,
    /// `None` for the "custom date" entry.
    pub value: Option<NaiveDateTime>,
}

/// Common deadline choices: end of today (or tomorrow once the day is over), tomorrow, next week.
pub fn deadline_presets(now: NaiveDateTime) -> Vec<DeadlinePreset> {
    let five_pm = NaiveTime::from_hms_opt(END_OF_DAY_HOUR, 0, 0).unwrap_or_default();
    let at_five = |days: i64| (now.date() + Duration::days(days)).and_time(five_pm);
    let today = if now.hour() < END_OF_DAY_HOUR { at_five(0) } else { at_five(1) };
    let preset = |name: &str, at: NaiveDateTime| DeadlinePreset {
        label: format!("{} ({})", name, at.format(DEADLINE_FORMAT)),
        value: Some(at),
    };
    vec![
        preset("Today", today),
        preset("Tomorrow", at_five(1)),
        preset("Next week", at_five(7)),
        DeadlinePreset {
            label: "Custom date".to_string(),
            value: None,
        },
    ]
}

/// Line-based question/answer loop over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompter { input, output }
    }

    fn io(e: std::io::Error) -> TodoError {
        TodoError::Validation(format!("could not read answer: {e}"))
    }

    fn read_answer(&mut self) -> Result<String, TodoError> {
        self.output.flush().map_err(Self::io)?;
        let mut line = String::new();
        let n = self.input.read_line(&mut line).map_err(Self::io)?;
        if n == 0 {
            return Err(TodoError::Validation("input ended before all answers were given".to_string()));
        }
        Ok(line.trim().to_string())
    }

    /// Asks until `parse` accepts the answer. An empty answer takes `default` when there is one.
    pub fn ask_with<T>(
        &mut self,
        question: &str,
        default: Option<&str>,
        parse: impl Fn(&str) -> Result<T, TodoError>,
    ) -> Result<T, TodoError> {
        let mut last_err = None;
        for _ in 0..MAX_ATTEMPTS {
            let shown = match default {
                Some(d) if !d.is_empty() => write!(self.output, "? {} [{}]: ", question, d),
                _ => write!(self.output, "? {}: ", question),
            };
            shown.map_err(Self::io)?;
            let answer = self.read_answer()?;
            let answer = match default {
                Some(d) if answer.is_empty() => d.to_string(),
                _ => answer,
            };
            match parse(&answer) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    writeln!(self.output, "  {}", e).map_err(Self::io)?;
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| TodoError::Validation(format!("no valid answer for '{}'", question))))
    }

    pub fn ask_text(&mut self, question: &str, default: Option<&str>) -> Result<String, TodoError> {
        self.ask_with(question, default, |s| Ok(s.to_string()))
    }

    /// Shows a numbered list and accepts either the number or the value itself.
    pub fn choose<T>(&mut self, question: &str, options: &[T], default: T) -> Result<T, TodoError>
    where
        T: FromStr<Err = TodoError> + Display + Copy + PartialEq,
    {
        self.choose_labeled(question, options, default, |o| o.to_string())
    }

    pub fn choose_labeled<T>(
        &mut self,
        question: &str,
        options: &[T],
        default: T,
        label: impl Fn(&T) -> String,
    ) -> Result<T, TodoError>
    where
        T: FromStr<Err = TodoError> + Display + Copy + PartialEq,
    {
        writeln!(self.output, "? {}", question).map_err(Self::io)?;
        for (i, o) in options.iter().enumerate() {
            let marker = if *o == default { ">" } else { " " };
            writeln!(self.output, " {} {}) {}", marker, i + 1, label(o)).map_err(Self::io)?;
        }
        let default_label = default.to_string();
        self.ask_with("Choice", Some(&default_label), |answer| {
            if let Ok(n) = answer.parse::<usize>() {
                if (1..=options.len()).contains(&n) {
                    return Ok(options[n - 1]);
                }
            }
            let v: T = answer.parse()?;
            if options.contains(&v) {
                Ok(v)
            } else {
                Err(TodoError::Validation(format!("'{}' is not one of the choices", answer)))
            }
        })
    }

    pub fn confirm(&mut self, question: &str, default: bool) -> Result<bool, TodoError> {
        let hint = if default { "Y/n" } else { "y/N" };
        self.ask_with(&format!("{} ({})", question, hint), None, |answer| {
            match answer.to_lowercase().as_str() {
                "" => Ok(default),
                "y" | "yes" => Ok(true),
                "n" | "no" => Ok(false),
                _ => Err(TodoError::Validation("Please answer y or n".to_string())),
            }
        })
    }

    /// Offers the deadline presets, falling back to free-form input for "Custom date".
    pub fn ask_deadline(&mut self, now: NaiveDateTime) -> Result<DeadlineInput, TodoError> {
        let presets = deadline_presets(now);
        writeln!(self.output, "? Choose deadline").map_err(Self::io)?;
        for (i, p) in presets.iter().enumerate() {
            writeln!(self.output, "   {}) {}", i + 1, p.label).map_err(Self::io)?;
        }
        let picked = self.ask_with("Choice", Some("1"), |answer| {
            answer
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=presets.len()).contains(n))
                .map(|n| presets[n - 1].value)
                .ok_or_else(|| TodoError::Validation(format!("Pick a number from 1 to {}", presets.len())))
        })?;
        match picked {
            Some(at) => Ok(DeadlineInput {
                deadline: Some(at),
                past: at < now,
            }),
            None => self.ask_with(
                "Enter custom deadline (YYYY-MM-DD HH:MM, empty for none)",
                None,
                |s| parse_deadline(s, now),
            ),
        }
    }
}

/// Task fields supplied up front (from command-line flags); anything missing is asked for.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub priority: Option<Priority>,
    pub mood: Option<Mood>,
    pub effort: Option<Effort>,
    pub difficulty: Option<Difficulty>,
    pub energy: Option<Energy>,
}

/// Completes a draft into a task. With `use_defaults`, missing fields take defaults
/// instead of being prompted for; a title is still required.
pub fn complete_draft<R: BufRead, W: Write>(
    draft: TaskDraft,
    prompter: &mut Prompter<R, W>,
    existing: &[Task],
    now: NaiveDateTime,
    use_defaults: bool,
) -> Result<(Task, DeadlineInput), TodoError> {
    let title = match draft.title {
        Some(t) => validate_title(&t, existing)?,
        None if use_defaults => return Err(TodoError::Validation("Task title cannot be empty".to_string())),
        None => prompter.ask_with("Task title", None, |s| validate_title(s, existing))?,
    };
    let description = match draft.description {
        Some(d) => d,
        None if use_defaults => String::new(),
        None => prompter.ask_text("Task description", Some(""))?,
    };
    let deadline = match draft.deadline {
        Some(d) => parse_deadline(&d, now)?,
        None if use_defaults => DeadlineInput {
            deadline: None,
            past: false,
        },
        None => prompter.ask_deadline(now)?,
    };

    macro_rules! pick {
        ($value:expr, $question:expr, $all:expr, $default:expr) => {
            match $value {
                Some(v) => v,
                None if use_defaults => $default,
                None => prompter.choose($question, &$all, $default)?,
            }
        };
    }

    let priority = match draft.priority {
        Some(p) => p,
        None if use_defaults => Priority::Medium,
        None => prompter.choose_labeled("Priority level", &Priority::ALL, Priority::Medium, |p| {
            format!("{} [{}]", p.level(), p)
        })?,
    };
    let effort = match draft.effort {
        Some(e) => e,
        None if use_defaults => Effort::Medium,
        None => prompter.choose_labeled("Estimated effort", &Effort::ALL, Effort::Medium, |e| {
            format!("{} [{}]", e, e.hint())
        })?,
    };
    let difficulty = pick!(draft.difficulty, "Task difficulty", Difficulty::ALL, Difficulty::Medium);
    let energy = pick!(draft.energy, "Energy required", Energy::ALL, Energy::Medium);
    let mood = match draft.mood {
        Some(m) => m,
        None if use_defaults => Mood::Any,
        None => prompter.choose_labeled("Required mood", &Mood::ALL, Mood::Any, |m| {
            format!("{} [{}]", m, m.icon())
        })?,
    };

    let mut task = Task::new(title, deadline.deadline, priority, mood);
    task.description = description;
    task.effort = effort;
    task.difficulty = difficulty;
    task.energy = energy;
    Ok((task, deadline))
}
