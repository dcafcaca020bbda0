use chrono::{Local, NaiveDateTime};
use ratatui::widgets::TableState;

use crate::error::TodoError;
use crate::models::{Mood, Status, Task};
use crate::storage::{JsonStore, TaskStore};
use crate::suggest::suggest_local;

/// A task as shown on the board, with its score for the current mood.
pub struct BoardRow {
    pub task: Task,
    /// `None` for completed tasks.
    pub score: Option<f64>,
    pub rationale: String,
}

pub struct App {
    pub store: JsonStore,
    pub rows: Vec<BoardRow>,
    pub state: TableState,
    pub mood: Mood,
    pub show_completed: bool,
    /// Last status line message (errors or confirmations).
    pub message: Option<String>,
    pub now: NaiveDateTime,
}

impl App {
    /// Creates a new App instance and loads initial data.
    pub fn new(store: JsonStore, mood: Mood) -> Result<App, TodoError> {
        let mut app = App {
            store,
            rows: Vec::new(),
            state: TableState::default(),
            mood,
            show_completed: false,
            message: None,
            now: Local::now().naive_local(),
        };
        app.reload()?;
        Ok(app)
    }

    /// Reloads tasks from storage and re-ranks them for the current mood.
    pub fn reload(&mut self) -> Result<(), TodoError> {
        self.now = Local::now().naive_local();
        let tasks = self.store.load_all()?;

        let mut rows: Vec<BoardRow> = suggest_local(&tasks, self.mood, self.now)
            .into_iter()
            .map(|r| BoardRow {
                task: r.task.clone(),
                score: Some(r.score),
                rationale: r.rationale,
            })
            .collect();
        if self.show_completed {
            rows.extend(tasks.iter().filter(|t| t.is_completed()).map(|t| BoardRow {
                task: t.clone(),
                score: None,
                rationale: "Completed.".to_string(),
            }));
        }
        self.rows = rows;

        if self.rows.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.rows.len() {
                self.state.select(Some(self.rows.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
        Ok(())
    }

    /// Selects the next row, wrapping around.
    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous row, wrapping around.
    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn selected(&self) -> Option<&BoardRow> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn cycle_mood(&mut self) {
        self.mood = self.mood.next_current();
        self.refresh();
    }

    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.refresh();
    }

    /// Moves the selected task one step forward (Not Started -> In Progress -> Completed).
    pub fn advance_selected(&mut self) {
        let Some(row) = self.selected() else { return };
        let title = row.task.title.clone();
        match row.task.status.advanced() {
            Some(next) => self.set_status(&title, next),
            None => self.message = Some(format!("'{}' is already completed", title)),
        }
    }

    pub fn complete_selected(&mut self) {
        let Some(row) = self.selected() else { return };
        let title = row.task.title.clone();
        self.set_status(&title, Status::Completed);
    }

    fn set_status(&mut self, title: &str, status: Status) {
        self.message = Some(match self.store.update_status(title, status) {
            Ok(_) => format!("'{}' is now {}", title, status),
            Err(e) => e.to_string(),
        });
        self.refresh();
    }

    fn refresh(&mut self) {
        if let Err(e) = self.reload() {
            self.message = Some(e.to_string());
        }
    }
}
