//! Application configuration: model endpoint, panel roster, session tuning.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (applied by the binary)
//! 2. TOML file (`--config`, or the path in `DEBATE_CONFIG`)
//! 3. Environment variables (`DEBATE_LLM_URL`, `DEBATE_LLM_MODEL`, `DEBATE_LLM_API_KEY`)
//! 4. Built-in defaults
//!
//! ```toml
//! [llm]
//! url = "http://localhost:8080/v1"
//! model = "qwen2.5-7b-instruct"
//!
//! [debate]
//! max_rounds = 4
//! per_call_timeout_ms = 30000
//!
//! [[workers]]
//! id = "geometry"
//! persona = "methodical"
//! capabilities = ["geometry"]
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use debate_coordination::DebateConfig;

use crate::prompts::Persona;

const DEFAULT_LLM_URL: &str = "http://localhost:8080/v1";
const DEFAULT_LLM_MODEL: &str = "qwen2.5-7b-instruct";
const DEFAULT_TEMPERATURE: f32 = 0.7;

const ENV_LLM_URL: &str = "DEBATE_LLM_URL";
const ENV_LLM_MODEL: &str = "DEBATE_LLM_MODEL";
const ENV_LLM_API_KEY: &str = "DEBATE_LLM_API_KEY";
/// Path of the TOML overlay when `--config` is not given.
pub const ENV_CONFIG_PATH: &str = "DEBATE_CONFIG";

/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmEndpoint {
    /// Base URL up to and including `/v1`.
    pub url: String,
    pub model: String,
    /// Bearer token; local servers usually need none.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for LlmEndpoint {
    fn default() -> Self {
        Self {
            url: DEFAULT_LLM_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }
}

/// What a panel member does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    #[default]
    Solver,
    Generalist,
    Evaluator,
}

/// One panel member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub id: String,
    #[serde(default)]
    pub role: WorkerRole,
    #[serde(default)]
    pub persona: Persona,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl WorkerSpec {
    pub fn solver(id: &str, persona: Persona, capabilities: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            role: WorkerRole::Solver,
            persona,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_role(mut self, role: WorkerRole) -> Self {
        self.role = role;
        self
    }
}

/// Geometry and algebra experts, a generalist fallback, and an evaluator.
pub fn default_roster() -> Vec<WorkerSpec> {
    vec![
        WorkerSpec::solver("geometry", Persona::Methodical, &["geometry"]),
        WorkerSpec::solver("algebra", Persona::Creative, &["algebra"]),
        WorkerSpec::solver("generalist", Persona::DetailOriented, &[])
            .with_role(WorkerRole::Generalist),
        WorkerSpec::solver("evaluator", Persona::Intuitive, &[]).with_role(WorkerRole::Evaluator),
    ]
}

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentsConfig {
    pub llm: LlmEndpoint,
    pub debate: DebateConfig,
    pub workers: Vec<WorkerSpec>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            llm: LlmEndpoint::default(),
            debate: DebateConfig::default(),
            workers: default_roster(),
        }
    }
}

/// TOML overlay. Every section is optional; `llm` keys are merged one by one.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    llm: LlmOverlay,
    debate: Option<DebateConfig>,
    workers: Option<Vec<WorkerSpec>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LlmOverlay {
    url: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AgentsConfig {
    /// Defaults overridden by the `DEBATE_LLM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var(ENV_LLM_URL) {
            config.llm.url = url;
        }
        if let Ok(model) = env::var(ENV_LLM_MODEL) {
            config.llm.model = model;
        }
        config.llm.api_key = env::var(ENV_LLM_API_KEY).ok().filter(|k| !k.is_empty());
        config
    }

    /// Environment configuration overlaid by the file at `path`, or at
    /// `DEBATE_CONFIG` when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::from_env();
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from));
        if let Some(path) = path {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            config
                .apply_toml(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
        }
        Ok(config)
    }

    /// Overlay a TOML document onto this configuration.
    pub fn apply_toml(&mut self, raw: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(raw).context("Failed to parse TOML")?;

        let llm = file.llm;
        if let Some(url) = llm.url {
            self.llm.url = url;
        }
        if let Some(model) = llm.model {
            self.llm.model = model;
        }
        if llm.api_key.is_some() {
            self.llm.api_key = llm.api_key;
        }
        if let Some(temperature) = llm.temperature {
            self.llm.temperature = temperature;
        }
        if llm.max_tokens.is_some() {
            self.llm.max_tokens = llm.max_tokens;
        }
        if let Some(debate) = file.debate {
            self.debate = debate;
        }
        if let Some(workers) = file.workers {
            self.workers = workers;
        }
        self.validate()
    }

    /// Reject rosters the coordinator cannot run.
    pub fn validate(&self) -> Result<()> {
        self.debate.validate().context("Invalid [debate] section")?;
        if !self.workers.iter().any(|w| w.role != WorkerRole::Evaluator) {
            bail!("roster has no solving workers");
        }
        let mut seen = std::collections::HashSet::new();
        for worker in &self.workers {
            if !seen.insert(worker.id.as_str()) {
                bail!("duplicate worker id: {}", worker.id);
            }
        }
        Ok(())
    }
}
