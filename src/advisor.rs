use chrono::NaiveDateTime;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::models::{Difficulty, Effort, Energy, Mood, Priority, Status};

/// What a task looks like to the ranking service.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub title: String,
    pub description: String,
    pub hours_until_deadline: Option<f64>,
    pub score: f64,
    pub priority: Priority,
    pub mood_required: Mood,
    pub effort: Effort,
    pub difficulty: Difficulty,
    pub energy_required: Energy,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct RankingRequest {
    pub mood: Mood,
    pub now: NaiveDateTime,
    /// Best local candidates first.
    pub candidates: Vec<CandidateSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankingResponse {
    /// Candidate titles, best first. May name only some of the candidates.
    pub ranking: Vec<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// An outside opinion on the order of the top candidates. Advisory only.
pub trait RankingAdvisor {
    fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, AdvisorError>;
}

/// Ranking through the Gemini `generateContent` API.
pub struct GeminiAdvisor {
    client: Client,
    api_key: String,
    url: String,
}

impl GeminiAdvisor {
    /// Builds the advisor, or returns `Disabled` when no API key is configured.
    pub fn from_config(config: &AdvisorConfig) -> Result<GeminiAdvisor, AdvisorError> {
        let api_key = config.api_key.clone().ok_or(AdvisorError::Disabled)?;
        let client = Client::builder().timeout(config.timeout).build()?;
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        Ok(GeminiAdvisor { client, api_key, url })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl RankingAdvisor for GeminiAdvisor {
    fn rank(&self, request: &RankingRequest) -> Result<RankingResponse, AdvisorError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(build_prompt(request)?),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let out: GenerateResponse = resp.json()?;
        let text: String = out
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        debug!(reply = %text, "ranking service replied");
        parse_reply(&text)
    }
}

/// Renders the instruction sent to the model.
pub fn build_prompt(request: &RankingRequest) -> Result<String, AdvisorError> {
    let tasks = serde_json::to_string_pretty(&request.candidates)
        .map_err(|e| AdvisorError::Malformed(e.to_string()))?;
    Ok(format!(
        r#"You are a task recommendation engine. Rank the tasks below by what the user should work on right now.

User's current state:
- Mood: {mood}
- Current time: {now}

Available tasks:
{tasks}

Consider, in order of importance:
1. Urgency (hours_until_deadline, score)
2. Fit between the task's energy/difficulty and the user's mood
3. Priority (1 = Low .. 4 = Critical)
4. Effort

Guidelines:
- Energetic: prefer challenging, high-energy tasks
- Focused: prefer complex tasks that need concentration
- Creative: prefer planning or creative work
- Relaxed or tired: prefer lighter tasks unless something is urgent

Reply with JSON only, exactly in this shape:
{{"ranking": ["<task title>", "..."], "reason": "<one or two sentences about the first task>"}}
Use the task titles verbatim."#,
        mood = request.mood,
        now = request.now.format("%Y-%m-%d %H:%M"),
        tasks = tasks,
    ))
}

/// Parses the model's reply, tolerating a surrounding markdown code fence.
pub fn parse_reply(text: &str) -> Result<RankingResponse, AdvisorError> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches("json");
        body = body.strip_suffix("```").unwrap_or(body);
    }
    serde_json::from_str(body.trim()).map_err(|e| AdvisorError::Malformed(e.to_string()))
}
