pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use app::App;
use ui::ui;

use crate::models::Mood;
use crate::storage::JsonStore;

/// Runs the interactive board until the user quits.
pub fn run_tui(store: JsonStore, mood: Mood) -> Result<(), Box<dyn Error>> {
    // Load before touching the terminal so store errors print normally
    let mut app = App::new(store, mood)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char('m') => app.cycle_mood(),
                KeyCode::Char('s') => app.advance_selected(),
                KeyCode::Char(' ') => app.complete_selected(),
                KeyCode::Char('c') => app.toggle_completed(),
                _ => {}
            }
        }
    }
}
