use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Env {
            dir: TempDir::new().expect("create tempdir"),
        }
    }

    fn todo(&self) -> Command {
        let mut cmd = Command::cargo_bin("todo").expect("binary built");
        cmd.arg("--db")
            .arg(self.dir.path().join("tasks.json"))
            .env_remove("GEMINI_API_KEY")
            .env_remove("TODO_DB")
            .env_remove("TODO_LOG");
        cmd
    }

    fn add(&self, title: &str, extra: &[&str]) {
        self.todo()
            .args(["add", "--title", title, "--yes"])
            .args(extra)
            .assert()
            .success()
            .stdout(predicate::str::contains("Task added successfully!"));
    }
}

#[test]
fn test_add_then_list() {
    let env = Env::new();
    env.add("Write report", &["--deadline", "2099-01-01 17:00", "--priority", "high", "--mood", "focused"]);
    env.add("Laundry", &["--priority", "1"]);

    env.todo()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Write report"))
        .stdout(predicate::str::contains("Laundry"))
        .stdout(predicate::str::contains("2099-01-01 17:00"));
}

#[test]
fn test_list_empty() {
    Env::new()
        .todo()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_completed_hidden_unless_all() {
    let env = Env::new();
    env.add("Finished thing", &[]);
    env.add("Open thing", &[]);
    env.todo()
        .args(["complete", "Finished thing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked as completed"));

    env.todo()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Open thing"))
        .stdout(predicate::str::contains("Finished thing").not());
    env.todo()
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Finished thing"));
}

#[test]
fn test_duplicate_title_fails_with_validation_code() {
    let env = Env::new();
    env.add("Taxes", &[]);
    env.todo()
        .args(["add", "--title", "Taxes", "--yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_bad_deadline_fails_with_validation_code() {
    Env::new()
        .todo()
        .args(["add", "--title", "X", "--deadline", "next tuesday", "--yes"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YYYY-MM-DD HH:MM"));
}

#[test]
fn test_status_changes_and_rejects_going_back() {
    let env = Env::new();
    env.add("Ship", &[]);
    env.todo().args(["status", "Ship", "in-progress"]).assert().success();
    env.todo().args(["status", "Ship", "completed"]).assert().success();
    env.todo().args(["status", "Ship", "not-started"]).assert().code(4);
}

#[test]
fn test_unknown_title_exits_not_found() {
    Env::new()
        .todo()
        .args(["complete", "Ghost"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Ghost"));
}

#[test]
fn test_corrupt_file_exits_store_error() {
    let env = Env::new();
    std::fs::write(env.dir.path().join("tasks.json"), "[{").unwrap();
    env.todo().arg("list").assert().code(5);
}

#[test]
fn test_suggest_ranks_locally_without_key() {
    let env = Env::new();
    env.add("Someday", &["--priority", "low", "--mood", "relaxed"]);
    env.add("Urgent", &["--deadline", "2000-01-01 09:00", "--priority", "critical", "--mood", "focused"]);

    let out = env
        .todo()
        .args(["suggest", "--mood", "focused", "--no-feedback"])
        .assert()
        .success()
        .stdout(predicate::str::contains("I suggest"))
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8(out).unwrap();
    let urgent = out.find("Urgent").unwrap();
    let someday = out.find("Someday").unwrap();
    assert!(urgent < someday);
}

#[test]
fn test_suggest_on_empty_store() {
    Env::new()
        .todo()
        .args(["suggest", "--mood", "tired", "--no-ai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No suitable tasks found"));
}

#[test]
fn test_completions() {
    Command::cargo_bin("todo")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("todo"));
}

#[test]
fn test_suggest_survives_unreachable_ranking_service() {
    let env = Env::new();
    env.add("Someday", &["--priority", "low", "--mood", "relaxed"]);
    env.add("Urgent", &["--deadline", "2000-01-01 09:00", "--priority", "critical", "--mood", "focused"]);

    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let out = env
        .todo()
        .env("GEMINI_API_KEY", "test-key")
        .env("TODO_AI_ENDPOINT", format!("http://127.0.0.1:{port}"))
        .env("TODO_AI_TIMEOUT_SECS", "2")
        .args(["suggest", "--mood", "focused", "--no-feedback"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AI:").not())
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8(out).unwrap();
    assert!(out.find("Urgent").unwrap() < out.find("Someday").unwrap());
}

#[test]
fn test_any_is_not_accepted_as_current_mood() {
    let env = Env::new();
    env.todo()
        .args(["suggest", "--mood", "any", "--no-ai"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("current mood"));
    env.todo().args(["ui", "--mood", "any"]).assert().failure();
}
