//! Prompt text for the chat workers and the evaluator.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever any text here changes so
//! logs can tie a response to the prompt that produced it.

use debate_coordination::{AgentResponse, Candidate, SolveRequest};
use serde::{Deserialize, Serialize};

/// Prompt version. Bump on any content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Appended to every solver system prompt.
pub const ANSWER_FORMAT: &str = "\
Your task is to assist in solving a math reasoning problem by providing a clear \
and detailed solution. Limit your output within 100 words, and your final answer \
should be a single numerical number, in the form of {{answer}}, at the end of \
your response. For example, 'The answer is {{42}}.'";

/// Evaluator system prompt.
pub const EVALUATOR_PREAMBLE: &str = "\
You are the evaluator of a panel of math experts. You receive a problem and the \
candidate answers of each expert. Check the candidates against the problem.

Reply with exactly one verdict line:
VERDICT: CONSENSUS   when the candidates agree on an answer you believe is correct
VERDICT: DISAGREE    otherwise

If you can determine the correct answer, end your reply with it in the form \
{{answer}}. Otherwise omit the braces entirely.";

/// Reasoning style of a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    #[default]
    Methodical,
    Creative,
    DetailOriented,
    Intuitive,
}

impl Persona {
    pub fn preamble(self) -> &'static str {
        match self {
            Self::Methodical => {
                "You are a methodical assistant who loves to break down problems step by \
                 step. You approach math problems systematically and show all your work clearly."
            }
            Self::Creative => {
                "You are a creative assistant who likes to find alternative approaches to \
                 math problems. You often think outside the box and consider multiple \
                 solution paths."
            }
            Self::DetailOriented => {
                "You are a detail-oriented assistant who focuses on precision and accuracy. \
                 You double-check your work and explain your reasoning thoroughly."
            }
            Self::Intuitive => {
                "You are an intuitive assistant who can quickly identify patterns and \
                 shortcuts. You balance speed with accuracy in your mathematical reasoning."
            }
        }
    }

    /// Full system prompt for a solver with this persona.
    pub fn system_prompt(self, expertise: Option<&str>) -> String {
        match expertise {
            Some(area) => format!(
                "{} You are the panel's {} expert. {}",
                self.preamble(),
                area,
                ANSWER_FORMAT
            ),
            None => format!("{} {}", self.preamble(), ANSWER_FORMAT),
        }
    }
}

/// User message for one solve call.
///
/// Round 0 asks for a fresh solution; later rounds show the peers' earlier
/// solutions first, numbered in the order they were recorded.
pub fn solver_prompt(request: &SolveRequest) -> String {
    if request.shared_context.is_empty() {
        return format!(
            "Can you solve the following math problem?\n{}\n\
             Coordinator instruction: {}\n\
             Explain your reasoning. Your final answer should be a single numerical \
             number, in the form of {{{{answer}}}}, at the end of your response.",
            request.problem, request.instruction
        );
    }

    let mut prompt = String::from("These are the solutions to the problem from other agents:\n");
    prompt.push_str(&peer_solutions(&request.shared_context));
    prompt.push_str(&format!(
        "Using the solutions from other agents as additional information, can you \
         provide your answer to the math problem? The original math problem is {}. \
         Coordinator instruction: {}\n\
         Consider if there are different approaches shown by other agents and explain \
         your reasoning. Your final answer should be a single numerical number, in the \
         form of {{{{answer}}}}, at the end of your response.",
        request.problem, request.instruction
    ));
    prompt
}

fn peer_solutions(responses: &[AgentResponse]) -> String {
    responses
        .iter()
        .enumerate()
        .map(|(i, r)| format!("Agent {} solution: {}\n", i + 1, r.content.trim()))
        .collect()
}

/// User message for one evaluate call.
pub fn evaluator_prompt(problem: &str, candidates: &[Candidate]) -> String {
    let mut prompt = format!("Problem: {}\n\nCandidate answers:\n", problem);
    for candidate in candidates {
        prompt.push_str(&format!("- {}: {}\n", candidate.worker_id, candidate.answer));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use debate_coordination::Problem;

    use super::*;

    fn request(shared: Vec<AgentResponse>) -> SolveRequest {
        SolveRequest {
            problem: Problem::new("What is 6 times 12?"),
            round: if shared.is_empty() { 0 } else { 1 },
            instruction: "Step 1/1: solve directly".into(),
            shared_context: Arc::from(shared),
        }
    }

    #[test]
    fn test_first_round_prompt_has_no_peers() {
        let prompt = solver_prompt(&request(Vec::new()));
        assert!(prompt.starts_with("Can you solve the following math problem?"));
        assert!(prompt.contains("What is 6 times 12?"));
        assert!(prompt.contains("{{answer}}"));
        assert!(!prompt.contains("Agent 1 solution"));
    }

    #[test]
    fn test_peer_solutions_are_numbered() {
        let prompt = solver_prompt(&request(vec![
            AgentResponse::new("algebra", 0, "6*12 = {{72}}", "72"),
            AgentResponse::new("geometry", 0, "  area {{70}} ", "70"),
        ]));
        assert!(prompt.contains("Agent 1 solution: 6*12 = {{72}}\n"));
        assert!(prompt.contains("Agent 2 solution: area {{70}}\n"));
        assert!(prompt.contains("The original math problem is What is 6 times 12?"));
    }

    #[test]
    fn test_system_prompt_mentions_expertise() {
        let prompt = Persona::Creative.system_prompt(Some("geometry"));
        assert!(prompt.contains("creative assistant"));
        assert!(prompt.contains("geometry expert"));
        assert!(prompt.ends_with("'The answer is {{42}}.'"));
    }

    #[test]
    fn test_evaluator_prompt_lists_candidates() {
        let prompt = evaluator_prompt(
            "q",
            &[Candidate::new("a", "72"), Candidate::new("b", "70")],
        );
        assert!(prompt.contains("- a: 72\n- b: 70\n"));
    }
}
