//! # Smart Todo
//!
//! A terminal todo list that tells you what to work on next. Tasks carry a deadline,
//! priority, the mood they are best done in, and how much effort, difficulty and energy
//! they take. `todo suggest` asks how you feel and ranks open tasks accordingly.
//!
//! ## Usage
//!
//! ```bash
//! # Add a task (prompts for anything not given as a flag)
//! todo add
//! todo add --title "Write report" --deadline "2025-12-01 17:00" --priority high --mood focused
//!
//! # List open tasks, best candidates first (add --all for completed ones)
//! todo list
//!
//! # Move a task along
//! todo status "Write report" in-progress
//! todo complete "Write report"
//!
//! # What should I do now?
//! todo suggest
//! todo suggest --mood tired --limit 3
//!
//! # Interactive board
//! todo ui
//! ```
//!
//! ## Ranking
//!
//! Each open task is scored from:
//! 1.  **Deadline**: closer deadlines score higher, overdue tasks score highest.
//! 2.  **Priority**: Critical > High > Medium > Low.
//! 3.  **Mood fit**: tasks for your current mood first, "any" tasks next, others last.
//! 4.  **Energy fit**: feeling tired pushes hard, draining tasks down; feeling energetic pulls them up.
//!
//! With `GEMINI_API_KEY` set, the best few candidates are also sent to Gemini for a second
//! opinion. If that call fails or times out the local ranking is used as-is.
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/smart-todo/tasks.json`
//! *   macOS: `~/Library/Application Support/smart-todo/tasks.json`
//! *   Windows: `%LOCALAPPDATA%\smart-todo\tasks.json`
//!
//! Override it with `--db <path>` or the `TODO_DB` environment variable. Suggestion
//! feedback is appended to `feedback.jsonl` in the same directory.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process;

use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use smart_todo::advisor::{GeminiAdvisor, RankingAdvisor};
use smart_todo::commands::*;
use smart_todo::config::Config;
use smart_todo::error::{AdvisorError, TodoError};
use smart_todo::models::{Difficulty, Effort, Energy, Mood, Priority, Status};
use smart_todo::prompt::{Prompter, TaskDraft};
use smart_todo::storage::{FeedbackLog, JsonStore};
use smart_todo::tui::run_tui;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Smart todo list that suggests tasks based on time and mood", long_about = None)]
struct Cli {
    /// Task file to use instead of the default
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task (interactive for any field not given)
    Add {
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Deadline, e.g. "2025-12-01 17:00"
        #[arg(short, long)]
        deadline: Option<String>,
        /// 1-4 or low, medium, high, critical
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Mood the task needs: energetic, focused, creative, relaxed, tired, any
        #[arg(short, long)]
        mood: Option<Mood>,
        /// short, medium, long
        #[arg(long)]
        effort: Option<Effort>,
        /// easy, medium, hard
        #[arg(long)]
        difficulty: Option<Difficulty>,
        /// low, medium, high
        #[arg(long)]
        energy: Option<Energy>,
        /// Use defaults instead of prompting for missing fields
        #[arg(short, long)]
        yes: bool,
    },
    /// List tasks
    List {
        /// Show completed tasks too
        #[arg(short, long)]
        all: bool,
    },
    /// Update a task's status
    Status {
        title: String,
        /// not-started, in-progress, completed
        status: Status,
    },
    /// Mark a task as completed
    Complete {
        title: String,
    },
    /// Get a task suggestion based on current mood
    Suggest {
        /// Current mood; asked for when omitted
        #[arg(short, long, value_parser = Mood::parse_current)]
        mood: Option<Mood>,
        /// Show at most this many suggestions
        #[arg(short, long)]
        limit: Option<usize>,
        /// Rank locally only, without calling the AI service
        #[arg(long)]
        no_ai: bool,
        /// Don't ask whether the suggestion helped
        #[arg(long)]
        no_feedback: bool,
    },
    /// Open the interactive board
    Ui {
        /// Mood to rank for initially
        #[arg(short, long, default_value = "focused", value_parser = Mood::parse_current)]
        mood: Mood,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("smart_todo=debug,todo=debug,warn")
    } else {
        EnvFilter::try_from_env("TODO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn advisor_for(config: &Config, no_ai: bool) -> Option<GeminiAdvisor> {
    if no_ai {
        return None;
    }
    match GeminiAdvisor::from_config(&config.advisor) {
        Ok(a) => Some(a),
        Err(AdvisorError::Disabled) => {
            debug!("GEMINI_API_KEY not set, ranking locally");
            None
        }
        Err(e) => {
            warn!("AI ranking unavailable: {e}");
            None
        }
    }
}

fn run(command: Commands, config: &Config) -> Result<(), TodoError> {
    let mut store = JsonStore::new(&config.db_path);
    let now = Local::now().naive_local();
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    match command {
        Commands::Add { title, description, deadline, priority, mood, effort, difficulty, energy, yes } => {
            let draft = TaskDraft { title, description, deadline, priority, mood, effort, difficulty, energy };
            cmd_add(&mut store, draft, &mut prompter, now, yes, false)?;
        }
        Commands::List { all } => cmd_list(&store, all, now)?,
        Commands::Status { title, status } => {
            cmd_status(&mut store, &title, status, false)?;
        }
        Commands::Complete { title } => {
            cmd_complete(&mut store, &title, false)?;
        }
        Commands::Suggest { mood, limit, no_ai, no_feedback } => {
            let advisor = advisor_for(config, no_ai);
            let options = SuggestOptions {
                mood,
                limit,
                ask_feedback: interactive && !no_feedback,
                top_k: config.advisor.top_k,
            };
            let feedback = FeedbackLog::new(config.feedback_path());
            cmd_suggest(
                &store,
                &feedback,
                advisor.as_ref().map(|a| a as &dyn RankingAdvisor),
                &options,
                &mut prompter,
                now,
                false,
            )?;
        }
        Commands::Ui { .. } | Commands::Completions { .. } => {}
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    dotenv::dotenv().ok();
    init_logging(cli.verbose);
    let config = Config::from_env(cli.db);
    debug!(db = %config.db_path.display(), "using task file");

    let code = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "todo", &mut io::stdout());
            0
        }
        Commands::Ui { mood } => match run_tui(JsonStore::new(&config.db_path), mood) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error running board: {}", e);
                1
            }
        },
        command => match run(command, &config) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: {}", e);
                e.exit_code()
            }
        },
    };
    process::exit(code);
}
