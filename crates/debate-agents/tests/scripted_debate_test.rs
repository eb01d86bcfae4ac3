//! End-to-end debates over the scripted panel, plus config file loading.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use debate_agents::config::{default_roster, AgentsConfig, WorkerRole};
use debate_agents::panel::{registry_from, scripted_panel};
use debate_agents::scripted::{ScriptMode, ScriptedEvaluator, ScriptedWorker};
use debate_coordination::{
    AnswerSource, Coordinator, DebateConfig, DebateEvent, Problem, SessionError, SharedWorker,
    TerminationReason,
};

#[tokio::test(start_paused = true)]
async fn test_mock_panel_solves_demo_question() {
    let config = AgentsConfig::default();
    let question = "What is 6 times 12?";
    let registry = scripted_panel(&config, question, Duration::from_millis(500)).unwrap();
    let coordinator = Coordinator::new(registry, config.debate.clone()).unwrap();

    let outcome = coordinator
        .run(Problem::new(question), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.final_answer, "72");

    let history = coordinator.event_bus().history();
    assert_eq!(history.first().map(|e| e.event_type()), Some("debate_start"));
    assert_eq!(history.last().map(|e| e.event_type()), Some("debate_end"));
    // "times" routes the question to the algebra expert.
    assert!(history.iter().any(|e| matches!(
        &e.event,
        DebateEvent::ExpertAssignment { assigned_experts, .. }
            if assigned_experts == &vec!["algebra".to_string()]
    )));
}

#[tokio::test]
async fn test_generalist_handles_unmatched_problem() {
    let workers: Vec<SharedWorker> = vec![
        Arc::new(ScriptedWorker::new("a", ["70", "72"])),
        Arc::new(ScriptedWorker::new("b", ["72"])),
        Arc::new(ScriptedWorker::new("c", ["72"]).generalist()),
        Arc::new(ScriptedEvaluator::new("judge")),
    ];
    let coordinator = Coordinator::new(
        registry_from(workers).unwrap(),
        DebateConfig::default().with_max_rounds(5),
    )
    .unwrap();

    // "hello" has no keywords, so only the generalist is assigned.
    let outcome = coordinator
        .run(Problem::new("hello"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.session.assignment().assigned_workers, vec!["c"]);
    assert_eq!(outcome.termination, TerminationReason::Consensus);
    assert_eq!(outcome.final_answer, "72");
}

#[tokio::test]
async fn test_evaluator_answer_overrides_vote() {
    let workers: Vec<SharedWorker> = vec![
        Arc::new(ScriptedWorker::new("a", ["70"]).generalist()),
        Arc::new(ScriptedEvaluator::new("judge").with_answer("72")),
    ];
    let coordinator = Coordinator::new(
        registry_from(workers).unwrap(),
        DebateConfig::default(),
    )
    .unwrap();
    let outcome = coordinator
        .run(Problem::new("hello"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.final_answer, "72");
    assert_eq!(outcome.source, AnswerSource::Evaluator);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_and_malformed_workers_are_absorbed() {
    let workers: Vec<SharedWorker> = vec![
        Arc::new(
            ScriptedWorker::new("slow", ["1"])
                .with_capabilities(&["algebra"])
                .with_mode(ScriptMode::AlwaysTimeout),
        ),
        Arc::new(
            ScriptedWorker::new("garbled", ["1"])
                .with_capabilities(&["algebra"])
                .with_mode(ScriptMode::AlwaysMalformed),
        ),
        Arc::new(ScriptedWorker::new("steady", ["72"]).with_capabilities(&["algebra"])),
    ];
    let config = DebateConfig::default()
        .with_max_rounds(2)
        .with_timeout(Duration::from_secs(2))
        .with_worker_pool(["slow", "garbled", "steady"]);
    let coordinator = Coordinator::new(registry_from(workers).unwrap(), config).unwrap();

    let outcome = coordinator
        .run(Problem::new("solve for x"), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.final_answer, "72");
    assert_eq!(outcome.session.assignment().assigned_workers.len(), 3);
    assert!(outcome
        .session
        .responses()
        .iter()
        .all(|r| r.worker_id == "steady"));
}

#[tokio::test(start_paused = true)]
async fn test_all_workers_timing_out_is_inconclusive() {
    let slow = Arc::new(ScriptedWorker::new("slow", ["1"]).with_mode(ScriptMode::AlwaysTimeout));
    let workers: Vec<SharedWorker> = vec![slow.clone()];
    let coordinator = Coordinator::new(
        registry_from(workers).unwrap(),
        DebateConfig::default()
            .with_max_rounds(2)
            .with_timeout(Duration::from_secs(1))
            .with_retries(1),
    )
    .unwrap();

    let err = coordinator
        .run(Problem::new("hello"), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Inconclusive(_)));
    // Two rounds, one retry each.
    assert_eq!(slow.calls(), 4);
}

#[tokio::test]
async fn test_scripted_panel_respects_worker_pool() {
    let mut config = AgentsConfig::default();
    config.debate = config.debate.with_worker_pool(["geometry", "evaluator"]);
    let registry = scripted_panel(&config, "Find the area of a square with side 6", Duration::ZERO)
        .unwrap();
    let coordinator = Coordinator::new(registry, config.debate.clone()).unwrap();

    let outcome = coordinator
        .run(
            Problem::new("Find the area of a square with side 6"),
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.session.assignment().assigned_workers, vec!["geometry"]);
    assert_eq!(outcome.final_answer, "36");
}

#[test]
fn test_load_overlays_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[llm]
model = "test-model"
temperature = 0.1

[debate]
max_rounds = 6
parallel_dispatch = false

[[workers]]
id = "solo"
role = "generalist"
persona = "creative"

[[workers]]
id = "judge"
role = "evaluator"
"#
    )
    .unwrap();

    let config = AgentsConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.llm.model, "test-model");
    assert_eq!(config.llm.temperature, 0.1);
    assert_eq!(config.debate.max_rounds, 6);
    assert!(!config.debate.parallel_dispatch);
    assert_eq!(config.workers.len(), 2);
    assert_eq!(config.workers[0].role, WorkerRole::Generalist);
}

#[test]
fn test_load_reports_missing_and_invalid_files() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = AgentsConfig::load(Some(&missing)).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config file"));

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[debate]\nmax_retries = 3\n").unwrap();
    let err = AgentsConfig::load(Some(&bad)).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("Invalid config file"));
    assert!(chain.contains("max_retries must be 0 or 1"));
}

#[test]
fn test_default_roster_has_one_evaluator() {
    let evaluators = default_roster()
        .into_iter()
        .filter(|w| w.role == WorkerRole::Evaluator)
        .count();
    assert_eq!(evaluators, 1);
}
