use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::TodoError;

/// Format used when a deadline is written back to the task file.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%d %H:%M";

const DEADLINE_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Strips prompt decorations (`"3 [High]"`, `"focused [F]"`) and normalises case and separators.
fn normalize(input: &str) -> String {
    let head = input.split(" [").next().unwrap_or(input);
    head.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect()
}

fn unknown(kind: &str, input: &str, expected: &str) -> TodoError {
    TodoError::Validation(format!("unknown {kind} '{input}', expected one of: {expected}"))
}

/// How important a task is. Stored as `1..=4` in the task file.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Critical];

    pub fn level(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            4 => Ok(Priority::Critical),
            other => Err(format!("priority {other} is out of range 1..=4")),
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.level()
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "1" | "low" => Ok(Priority::Low),
            "2" | "medium" => Ok(Priority::Medium),
            "3" | "high" => Ok(Priority::High),
            "4" | "critical" => Ok(Priority::Critical),
            _ => Err(unknown("priority", s, "1-4, low, medium, high, critical")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// The state of mind a task needs, or the user is currently in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Energetic,
    Focused,
    Creative,
    Relaxed,
    Tired,
    Any,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Any,
        Mood::Energetic,
        Mood::Focused,
        Mood::Creative,
        Mood::Relaxed,
        Mood::Tired,
    ];

    /// Moods a user can report for themselves. `Any` only makes sense on a task.
    pub const CURRENT: [Mood; 5] = [
        Mood::Energetic,
        Mood::Focused,
        Mood::Creative,
        Mood::Relaxed,
        Mood::Tired,
    ];

    pub fn icon(self) -> &'static str {
        match self {
            Mood::Any => "*",
            Mood::Energetic => "[E]",
            Mood::Focused => "[F]",
            Mood::Creative => "[C]",
            Mood::Relaxed => "[R]",
            Mood::Tired => "[T]",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Focused => "focused",
            Mood::Creative => "creative",
            Mood::Relaxed => "relaxed",
            Mood::Tired => "tired",
            Mood::Any => "any",
        }
    }

    /// Parses a mood the user reports for themselves, rejecting `any`.
    pub fn parse_current(s: &str) -> Result<Mood, TodoError> {
        match s.parse::<Mood>()? {
            Mood::Any => Err(unknown("current mood", s, "energetic, focused, creative, relaxed, tired")),
            m => Ok(m),
        }
    }

    /// Next reportable mood, wrapping around. Used by the board to cycle moods.
    pub fn next_current(self) -> Mood {
        let idx = Mood::CURRENT.iter().position(|m| *m == self).unwrap_or(0);
        Mood::CURRENT[(idx + 1) % Mood::CURRENT.len()]
    }
}

impl FromStr for Mood {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "energetic" | "e" => Ok(Mood::Energetic),
            "focused" | "f" => Ok(Mood::Focused),
            "creative" | "c" => Ok(Mood::Creative),
            "relaxed" | "r" => Ok(Mood::Relaxed),
            "tired" | "t" => Ok(Mood::Tired),
            "any" | "*" => Ok(Mood::Any),
            _ => Err(unknown("mood", s, "energetic, focused, creative, relaxed, tired, any")),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rough size of a task: Short is 15-30min, Medium 30min-1hr, Long more than an hour.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effort {
    Short,
    Medium,
    Long,
}

impl Effort {
    pub const ALL: [Effort; 3] = [Effort::Short, Effort::Medium, Effort::Long];

    pub fn hint(self) -> &'static str {
        match self {
            Effort::Short => "15-30min",
            Effort::Medium => "30min-1hr",
            Effort::Long => ">1hr",
        }
    }
}

impl FromStr for Effort {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "short" | "s" => Ok(Effort::Short),
            "medium" | "m" => Ok(Effort::Medium),
            "long" | "l" => Ok(Effort::Long),
            _ => Err(unknown("effort", s, "short, medium, long")),
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl FromStr for Difficulty {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(unknown("difficulty", s, "easy, medium, hard")),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Energy {
    Low,
    Medium,
    High,
}

impl Energy {
    pub const ALL: [Energy; 3] = [Energy::Low, Energy::Medium, Energy::High];
}

impl FromStr for Energy {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(Energy::Low),
            "medium" => Ok(Energy::Medium),
            "high" => Ok(Energy::High),
            _ => Err(unknown("energy", s, "low, medium, high")),
        }
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Lifecycle of a task. Only moves forward; `Completed` is terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Completed];

    pub fn can_transition_to(self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::NotStarted, Status::InProgress)
                | (Status::NotStarted, Status::Completed)
                | (Status::InProgress, Status::Completed)
        )
    }

    /// The status the board moves a task to when it is advanced one step.
    pub fn advanced(self) -> Option<Status> {
        match self {
            Status::NotStarted => Some(Status::InProgress),
            Status::InProgress => Some(Status::Completed),
            Status::Completed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl FromStr for Status {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "notstarted" | "todo" => Ok(Status::NotStarted),
            "inprogress" | "started" | "doing" => Ok(Status::InProgress),
            "completed" | "done" => Ok(Status::Completed),
            _ => Err(unknown("status", s, "not-started, in-progress, completed")),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a single task. The title is the key within a store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    /// Unique, non-empty title.
    pub title: String,
    pub description: String,
    /// `None` when the task has no deadline.
    pub deadline: Option<NaiveDateTime>,
    pub priority: Priority,
    /// Mood the task is best tackled in.
    pub mood: Mood,
    pub effort: Effort,
    pub difficulty: Difficulty,
    /// Energy the task demands.
    pub energy: Energy,
    pub status: Status,
}

impl Task {
    /// Creates a not-started task with medium effort, difficulty and energy.
    pub fn new(title: impl Into<String>, deadline: Option<NaiveDateTime>, priority: Priority, mood: Mood) -> Task {
        Task {
            title: title.into(),
            description: String::new(),
            deadline,
            priority,
            mood,
            effort: Effort::Medium,
            difficulty: Difficulty::Medium,
            energy: Energy::Medium,
            status: Status::NotStarted,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Moves the task to `next`, refusing backwards or repeated transitions.
    pub fn transition(&mut self, next: Status) -> Result<(), TodoError> {
        if !self.status.can_transition_to(next) {
            return Err(TodoError::InvalidTransition {
                title: self.title.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn deadline_label(&self) -> String {
        self.deadline
            .map(|d| d.format(DEADLINE_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Parses a deadline in any of the accepted layouts. A bare date means the end of that day.
pub fn parse_deadline_str(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    for fmt in DEADLINE_INPUT_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| NaiveTime::from_hms_opt(23, 59, 0).map(|t| d.and_time(t)))
}

fn default_mood() -> Mood {
    Mood::Any
}

fn default_effort() -> Effort {
    Effort::Medium
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

fn default_energy() -> Energy {
    Energy::Medium
}

fn default_status() -> Status {
    Status::NotStarted
}

/// On-disk shape of a task, kept compatible with files that carry a separate `completed` flag.
#[derive(Serialize, Deserialize)]
struct TaskRecord {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    deadline: Option<String>,
    priority: Priority,
    #[serde(default = "default_mood")]
    mood_required: Mood,
    #[serde(default = "default_effort")]
    effort: Effort,
    #[serde(default = "default_difficulty")]
    difficulty: Difficulty,
    #[serde(default = "default_energy")]
    energy_required: Energy,
    #[serde(default)]
    completed: bool,
    #[serde(default = "default_status")]
    status: Status,
}

impl TryFrom<TaskRecord> for Task {
    type Error = String;

    fn try_from(r: TaskRecord) -> Result<Self, Self::Error> {
        if r.title.trim().is_empty() {
            return Err("task title must not be empty".to_string());
        }
        let deadline = match r.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                parse_deadline_str(raw)
                    .ok_or_else(|| format!("task '{}' has an unreadable deadline '{}'", r.title, raw))?,
            ),
        };
        let status = if r.completed { Status::Completed } else { r.status };
        Ok(Task {
            title: r.title,
            description: r.description,
            deadline,
            priority: r.priority,
            mood: r.mood_required,
            effort: r.effort,
            difficulty: r.difficulty,
            energy: r.energy_required,
            status,
        })
    }
}

impl From<Task> for TaskRecord {
    fn from(t: Task) -> Self {
        TaskRecord {
            completed: t.is_completed(),
            deadline: t.deadline.map(|d| d.format(DEADLINE_FORMAT).to_string()),
            title: t.title,
            description: t.description,
            priority: t.priority,
            mood_required: t.mood,
            effort: t.effort,
            difficulty: t.difficulty,
            energy_required: t.energy,
            status: t.status,
        }
    }
}
