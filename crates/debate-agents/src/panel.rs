//! Turns a roster into a worker registry.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tracing::info;

use debate_coordination::{SharedWorker, WorkerRegistry};

use crate::chat::{ChatClient, ChatEvaluator, ChatWorker};
use crate::config::{AgentsConfig, WorkerRole};
use crate::scripted::scripted_roster;

/// Register workers in roster order, rejecting duplicate ids.
pub fn registry_from(workers: Vec<SharedWorker>) -> Result<WorkerRegistry> {
    let mut registry = WorkerRegistry::new();
    for worker in workers {
        let id = worker.id().to_string();
        if !registry.register(worker) {
            bail!("duplicate worker id: {id}");
        }
    }
    Ok(registry)
}

/// Chat-backed panel sharing one client.
pub fn chat_panel(config: &AgentsConfig) -> Result<WorkerRegistry> {
    let client = Arc::new(ChatClient::new(config.llm.clone())?);
    info!(
        url = %config.llm.url,
        model = %config.llm.model,
        workers = config.workers.len(),
        "building chat panel"
    );
    let workers = config
        .workers
        .iter()
        .map(|spec| -> SharedWorker {
            match spec.role {
                WorkerRole::Evaluator => Arc::new(ChatEvaluator::new(&spec.id, client.clone())),
                WorkerRole::Generalist => Arc::new(
                    ChatWorker::new(
                        &spec.id,
                        spec.persona,
                        spec.capabilities.clone(),
                        client.clone(),
                    )
                    .generalist(),
                ),
                WorkerRole::Solver => Arc::new(ChatWorker::new(
                    &spec.id,
                    spec.persona,
                    spec.capabilities.clone(),
                    client.clone(),
                )),
            }
        })
        .collect();
    registry_from(workers)
}

/// Offline panel replaying canned answers for `question`.
pub fn scripted_panel(
    config: &AgentsConfig,
    question: &str,
    delay: Duration,
) -> Result<WorkerRegistry> {
    info!(workers = config.workers.len(), "building scripted panel");
    registry_from(scripted_roster(&config.workers, question, delay))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::ScriptedWorker;

    #[test]
    fn test_chat_panel_keeps_roster_order_and_roles() {
        let registry = chat_panel(&AgentsConfig::default()).unwrap();
        assert_eq!(
            registry.ids(),
            vec!["geometry", "algebra", "generalist", "evaluator"]
        );
        assert_eq!(registry.evaluator().map(|w| w.id()), Some("evaluator"));
        assert_eq!(registry.solvers().count(), 3);
        assert!(registry.get("generalist").unwrap().is_generalist());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let err = registry_from(vec![
            Arc::new(ScriptedWorker::new("a", ["1"])) as SharedWorker,
            Arc::new(ScriptedWorker::new("a", ["2"])) as SharedWorker,
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate worker id: a"));
    }
}
