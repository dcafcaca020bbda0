use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use smart_todo::advisor::{GeminiAdvisor, RankingAdvisor, RankingRequest};
use smart_todo::config::AdvisorConfig;
use smart_todo::error::AdvisorError;
use smart_todo::models::{Mood, Priority, Task};
use smart_todo::suggest::{suggest, suggest_local, RankingSource};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap().and_hms_opt(9, 30, 0).unwrap()
}

fn tasks() -> Vec<Task> {
    vec![
        Task::new("Report", Some(now() + chrono::Duration::hours(3)), Priority::Critical, Mood::Focused),
        Task::new("Laundry", Some(now() + chrono::Duration::days(4)), Priority::Low, Mood::Relaxed),
        Task::new("Inbox", None, Priority::Medium, Mood::Any),
    ]
}

fn titles(results: &[smart_todo::suggest::SuggestionResult]) -> Vec<String> {
    results.iter().map(|r| r.task.title.clone()).collect()
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Answers every connection with `status` and `body` after `delay`, passing each request on.
fn serve(status: &str, body: &str, delay: Duration) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let request = read_request(&mut stream);
            let _ = tx.send(request);
            thread::sleep(delay);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    (endpoint, rx)
}

fn advisor(endpoint: String) -> GeminiAdvisor {
    GeminiAdvisor::from_config(&AdvisorConfig {
        api_key: Some("test-key".to_string()),
        model: "gemini-test".to_string(),
        endpoint,
        timeout: Duration::from_millis(200),
        top_k: 3,
    })
    .unwrap()
}

fn request() -> RankingRequest {
    RankingRequest {
        mood: Mood::Focused,
        now: now(),
        candidates: Vec::new(),
    }
}

fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
    .to_string()
}

#[test]
fn test_request_shape_and_adopted_order() {
    let (endpoint, rx) = serve("200 OK", &gemini_reply(r#"{"ranking": ["Inbox"], "reason": "Quick win."}"#), Duration::ZERO);
    let tasks = tasks();
    let advisor = advisor(endpoint);
    let out = suggest(&tasks, Mood::Focused, now(), Some(&advisor), 3);
    assert_eq!(out.source, RankingSource::Advisor);
    assert_eq!(out.advisor_note.as_deref(), Some("Quick win."));
    assert_eq!(titles(&out.results)[0], "Inbox");

    let sent = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    let lower = sent.to_lowercase();
    assert!(sent.starts_with("POST /models/gemini-test:generateContent "), "{sent}");
    assert!(lower.contains("x-goog-api-key: test-key"), "{sent}");
    assert!(sent.contains(r#""responseMimeType":"application/json""#), "{sent}");
    assert!(sent.contains("Mood: focused"), "{sent}");
    for t in ["Report", "Laundry", "Inbox"] {
        assert!(sent.contains(t), "{t} missing from {sent}");
    }
}

#[test]
fn test_server_error_falls_back_after_one_attempt() {
    let (endpoint, rx) = serve("500 Internal Server Error", r#"{"error": "boom"}"#, Duration::ZERO);
    let tasks = tasks();
    let advisor = advisor(endpoint);

    assert!(matches!(
        advisor.rank(&request()),
        Err(AdvisorError::Status { status: 500, .. })
    ));
    rx.recv_timeout(Duration::from_secs(2)).unwrap();

    let out = suggest(&tasks, Mood::Focused, now(), Some(&advisor), 3);
    assert_eq!(out.source, RankingSource::Local);
    assert_eq!(titles(&out.results), titles(&suggest_local(&tasks, Mood::Focused, now())));
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err(), "request was retried");
}

#[test]
fn test_unusable_replies_fall_back() {
    let tasks = tasks();
    let local = titles(&suggest_local(&tasks, Mood::Focused, now()));
    for body in [r#"{"candidates":[]}"#.to_string(), "not json at all".to_string(), gemini_reply("Do the report first.")] {
        let (endpoint, _rx) = serve("200 OK", &body, Duration::ZERO);
        let advisor = advisor(endpoint);
        assert!(
            matches!(advisor.rank(&request()), Err(AdvisorError::Malformed(_))),
            "{body}"
        );
        let out = suggest(&tasks, Mood::Focused, now(), Some(&advisor), 3);
        assert_eq!(out.source, RankingSource::Local);
        assert_eq!(titles(&out.results), local);
    }
}

#[test]
fn test_slow_service_times_out_and_falls_back() {
    let (endpoint, _rx) = serve("200 OK", &gemini_reply(r#"{"ranking": ["Inbox"]}"#), Duration::from_secs(2));
    let tasks = tasks();
    let advisor = advisor(endpoint);

    assert!(matches!(advisor.rank(&request()), Err(AdvisorError::Timeout)));

    let started = std::time::Instant::now();
    let out = suggest(&tasks, Mood::Focused, now(), Some(&advisor), 3);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(out.source, RankingSource::Local);
    assert_eq!(titles(&out.results), titles(&suggest_local(&tasks, Mood::Focused, now())));
}
