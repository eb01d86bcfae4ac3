//! Concrete expert workers for `debate-coordination`.
//!
//! - `chat`: solvers and an evaluator over an OpenAI-compatible endpoint
//! - `scripted`: deterministic workers for the offline demo and tests
//! - `prompts`: personas and prompt templates
//! - `config`: endpoint, roster, and session tuning from env + TOML
//! - `panel`: roster → `WorkerRegistry`

pub mod chat;
pub mod config;
pub mod panel;
pub mod prompts;
pub mod scripted;

pub use chat::{ChatClient, ChatEvaluator, ChatWorker};
pub use config::{AgentsConfig, LlmEndpoint, WorkerRole, WorkerSpec};
pub use panel::{chat_panel, registry_from, scripted_panel};
pub use prompts::Persona;
pub use scripted::{ScriptMode, ScriptedEvaluator, ScriptedWorker};
