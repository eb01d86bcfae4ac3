//! Workers backed by an OpenAI-compatible `/chat/completions` endpoint.
//!
//! Each call is stateless: the system prompt carries the persona, the user
//! message carries the problem, the coordinator's instruction, and any peer
//! solutions from earlier rounds. The coordinator enforces the time budget,
//! so the HTTP client only bounds connection setup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use debate_coordination::{
    extract_answer, Candidate, EvaluatorVerdict, Problem, SolveRequest, Worker, WorkerError,
    WorkerReply,
};

use crate::config::LlmEndpoint;
use crate::prompts::{self, Persona, PROMPT_VERSION};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Thin client for one chat-completions endpoint, shared by every worker.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: LlmEndpoint,
}

impl ChatClient {
    pub fn new(endpoint: LlmEndpoint) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &LlmEndpoint {
        &self.endpoint
    }

    /// Send one system + user exchange and return the assistant text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, WorkerError> {
        let url = format!("{}/chat/completions", self.endpoint.url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.endpoint.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.endpoint.temperature,
            max_tokens: self.endpoint.max_tokens,
        };

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.endpoint.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkerError::Failed(format!("request to {url} failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WorkerError::Failed(format!(
                "{url} returned {status}: {}",
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::Failed(format!("invalid completion payload: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| WorkerError::MalformedOutput("empty completion".into()))
    }
}

/// A solver with a persona and capability tags.
pub struct ChatWorker {
    id: String,
    capabilities: Vec<String>,
    generalist: bool,
    system_prompt: String,
    client: Arc<ChatClient>,
}

impl ChatWorker {
    pub fn new(
        id: impl Into<String>,
        persona: Persona,
        capabilities: Vec<String>,
        client: Arc<ChatClient>,
    ) -> Self {
        let system_prompt = persona.system_prompt(capabilities.first().map(String::as_str));
        Self {
            id: id.into(),
            capabilities,
            generalist: false,
            system_prompt,
            client,
        }
    }

    pub fn generalist(mut self) -> Self {
        self.generalist = true;
        self
    }
}

#[async_trait]
impl Worker for ChatWorker {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn is_generalist(&self) -> bool {
        self.generalist
    }

    async fn solve(&self, request: &SolveRequest) -> Result<WorkerReply, WorkerError> {
        let prompt = prompts::solver_prompt(request);
        debug!(
            worker = %self.id,
            round = request.round,
            peers = request.shared_context.len(),
            prompt_version = PROMPT_VERSION,
            "sending solve request"
        );
        let content = self.client.complete(&self.system_prompt, &prompt).await?;
        Ok(WorkerReply::text(content))
    }
}

/// The panel's evaluator. Never takes part in solving rounds.
pub struct ChatEvaluator {
    id: String,
    client: Arc<ChatClient>,
}

impl ChatEvaluator {
    pub fn new(id: impl Into<String>, client: Arc<ChatClient>) -> Self {
        Self {
            id: id.into(),
            client,
        }
    }
}

#[async_trait]
impl Worker for ChatEvaluator {
    fn id(&self) -> &str {
        &self.id
    }

    fn capabilities(&self) -> &[String] {
        &[]
    }

    fn can_solve(&self) -> bool {
        false
    }

    fn can_evaluate(&self) -> bool {
        true
    }

    async fn solve(&self, _request: &SolveRequest) -> Result<WorkerReply, WorkerError> {
        Err(WorkerError::Unsupported(self.id.clone()))
    }

    async fn evaluate(
        &self,
        problem: &Problem,
        candidates: &[Candidate],
    ) -> Result<EvaluatorVerdict, WorkerError> {
        let prompt = prompts::evaluator_prompt(problem.statement(), candidates);
        let content = self
            .client
            .complete(prompts::EVALUATOR_PREAMBLE, &prompt)
            .await?;
        parse_verdict(&content)
    }
}

/// Read the `VERDICT:` line and the optional `{{answer}}` of an evaluator reply.
pub fn parse_verdict(content: &str) -> Result<EvaluatorVerdict, WorkerError> {
    let verdict = content
        .lines()
        .filter_map(|line| {
            let upper = line.trim().to_uppercase();
            upper
                .strip_prefix("VERDICT:")
                .map(|rest| rest.trim().to_string())
        })
        .last()
        .ok_or_else(|| {
            WorkerError::MalformedOutput(format!(
                "no VERDICT line in evaluator reply: {}",
                content.chars().take(80).collect::<String>()
            ))
        })?;

    let consensus = match verdict.as_str() {
        v if v.starts_with("CONSENSUS") => true,
        v if v.starts_with("DISAGREE") => false,
        other => {
            return Err(WorkerError::MalformedOutput(format!(
                "unknown verdict: {other}"
            )))
        }
    };

    Ok(EvaluatorVerdict {
        consensus,
        final_answer: extract_answer(content),
        rationale: content.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_consensus_with_answer() {
        let verdict =
            parse_verdict("Both experts computed 6*12.\nVERDICT: CONSENSUS\n{{72}}").unwrap();
        assert!(verdict.consensus);
        assert_eq!(verdict.final_answer.as_deref(), Some("72"));
    }

    #[test]
    fn test_parse_disagreement_without_answer() {
        let verdict = parse_verdict("verdict: disagree").unwrap();
        assert!(!verdict.consensus);
        assert!(verdict.final_answer.is_none());
    }

    #[test]
    fn test_parse_rejects_missing_or_unknown_verdict() {
        assert!(matches!(
            parse_verdict("The answer is {{72}}."),
            Err(WorkerError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_verdict("VERDICT: maybe"),
            Err(WorkerError::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.2,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_chat_response_parses_null_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
                .unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
