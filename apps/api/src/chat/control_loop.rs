//! Chat control loop — generate, evaluate, and on rejection regenerate once.
//!
//! Flow: policies → responder (first pass) → evaluator →
//!       accepted: return reply | rejected: responder (rerun) → return reply.
//!
//! The rerun reply is returned without a second evaluation: at most one
//! corrective pass happens per turn, even if the rerun is no better.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::chat::evaluator::Evaluator;
use crate::chat::policy::PromptPolicy;
use crate::chat::prompts::{build_rerun_system_prompt, build_responder_system_prompt};
use crate::chat::responder::Responder;
use crate::errors::AppError;
use crate::models::message::Message;
use crate::persona::PersonaContext;

/// What a turn produced and whether the quality gate forced a rerun.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub rerun: bool,
}

/// Orchestrates one user turn. Holds no per-turn state; share it behind an `Arc`.
pub struct ChatLoop {
    persona: Arc<PersonaContext>,
    responder: Arc<dyn Responder>,
    evaluator: Arc<dyn Evaluator>,
    policies: Vec<Arc<dyn PromptPolicy>>,
}

impl ChatLoop {
    pub fn new(
        persona: Arc<PersonaContext>,
        responder: Arc<dyn Responder>,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        Self {
            persona,
            responder,
            evaluator,
            policies: Vec::new(),
        }
    }

    /// Registers a prompt policy; policies apply in registration order.
    pub fn with_policy(mut self, policy: Arc<dyn PromptPolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn persona(&self) -> &PersonaContext {
        &self.persona
    }

    /// Answers `message` and returns only the reply text.
    #[allow(dead_code)]
    pub async fn handle(&self, message: &str, history: &[Message]) -> Result<String, AppError> {
        self.handle_turn(message, history)
            .await
            .map(|outcome| outcome.reply)
    }

    /// Runs the full turn. Responder and evaluator errors propagate untouched.
    pub async fn handle_turn(
        &self,
        message: &str,
        history: &[Message],
    ) -> Result<TurnOutcome, AppError> {
        let span = info_span!("chat_turn", turn_id = %Uuid::new_v4(), history_len = history.len());
        self.run_turn(message, history).instrument(span).await
    }

    async fn run_turn(&self, message: &str, history: &[Message]) -> Result<TurnOutcome, AppError> {
        let base_system = build_responder_system_prompt(&self.persona);

        // Generating
        let system = self.apply_policies(&base_system, message);
        let reply = self
            .responder
            .generate_reply(history, message, &system)
            .await?;

        // Evaluating
        let evaluation = self
            .evaluator
            .evaluate_reply(&reply, message, history)
            .await?;

        if evaluation.is_acceptable {
            info!("Passed evaluation - returning reply");
            return Ok(TurnOutcome {
                reply,
                rerun: false,
            });
        }

        // Regenerating: built from the base prompt, so style directives do not carry over.
        warn!(feedback = %evaluation.feedback, "Failed evaluation - retrying");
        let rerun_system = build_rerun_system_prompt(&base_system, &reply, &evaluation.feedback);
        let rerun_reply = self
            .responder
            .generate_reply(history, message, &rerun_system)
            .await?;

        Ok(TurnOutcome {
            reply: rerun_reply,
            rerun: true,
        })
    }

    fn apply_policies(&self, base: &str, message: &str) -> String {
        self.policies
            .iter()
            .filter_map(|policy| policy.directive(message))
            .fold(base.to_string(), |mut system, directive| {
                system.push_str("\n\n");
                system.push_str(&directive);
                system
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::evaluator::Evaluation;
    use crate::chat::policy::{StyleTrigger, PIG_LATIN_MARKER};
    use crate::chat::prompts::REJECTION_HEADING;
    use crate::chat::testing::{StubEvaluator, StubResponder};
    use crate::llm_client::LlmError;

    fn persona() -> Arc<PersonaContext> {
        Arc::new(PersonaContext::new(
            "Test Name",
            "Summary text",
            "PDF page 1 text",
        ))
    }

    fn chat_loop(responder: Arc<StubResponder>, evaluator: Arc<StubEvaluator>) -> ChatLoop {
        ChatLoop::new(persona(), responder, evaluator)
            .with_policy(Arc::new(StyleTrigger::pig_latin("patent")))
    }

    #[tokio::test]
    async fn test_accepted_reply_is_returned_unchanged() {
        let responder = Arc::new(StubResponder::replying(&["R1"]));
        let evaluator = Arc::new(StubEvaluator::verdict(true, "ok"));
        let chat = chat_loop(responder.clone(), evaluator.clone());

        let reply = chat.handle("hi", &[]).await.unwrap();

        assert_eq!(reply, "R1");
        assert_eq!(responder.calls(), 1);
        assert_eq!(evaluator.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_reply_is_rerun_exactly_once() {
        let responder = Arc::new(StubResponder::replying(&["R1", "R2"]));
        let evaluator = Arc::new(StubEvaluator::verdict(false, "too short"));
        let chat = chat_loop(responder.clone(), evaluator.clone());

        let reply = chat.handle("hi", &[]).await.unwrap();

        assert_eq!(reply, "R2");
        assert_eq!(responder.calls(), 2);
        assert_eq!(evaluator.calls(), 1);
    }

    #[tokio::test]
    async fn test_rerun_prompt_embeds_rejected_reply_and_feedback() {
        let responder = Arc::new(StubResponder::replying(&["R1", "R2"]));
        let evaluator = Arc::new(StubEvaluator::verdict(false, "too short"));
        let chat = chat_loop(responder.clone(), evaluator);

        let outcome = chat.handle_turn("hi", &[]).await.unwrap();
        assert!(outcome.rerun);

        let systems = responder.system_prompts();
        assert!(!systems[0].contains(REJECTION_HEADING));
        assert!(systems[1].starts_with(&build_responder_system_prompt(&persona())));
        assert!(systems[1].contains(REJECTION_HEADING));
        assert!(systems[1].contains("R1"));
        assert!(systems[1].contains("too short"));
    }

    #[tokio::test]
    async fn test_accepted_feedback_does_not_alter_reply() {
        let responder = Arc::new(StubResponder::replying(&["R1"]));
        let evaluator = Arc::new(StubEvaluator::verdict(true, "could be warmer"));
        let chat = chat_loop(responder, evaluator);

        let outcome = chat.handle_turn("hi", &[]).await.unwrap();

        assert_eq!(
            outcome,
            TurnOutcome {
                reply: "R1".to_string(),
                rerun: false
            }
        );
    }

    #[tokio::test]
    async fn test_trigger_word_adds_style_directive_to_first_pass() {
        let responder = Arc::new(StubResponder::replying(&["Iway oldhay away atentpay"]));
        let evaluator = Arc::new(StubEvaluator::verdict(true, "ok"));
        let chat = chat_loop(responder.clone(), evaluator);

        chat.handle("Do you hold a patent?", &[]).await.unwrap();

        assert!(responder.system_prompts()[0].contains(PIG_LATIN_MARKER));
    }

    #[tokio::test]
    async fn test_plain_message_has_no_style_directive() {
        let responder = Arc::new(StubResponder::replying(&["R1"]));
        let evaluator = Arc::new(StubEvaluator::verdict(true, "ok"));
        let chat = chat_loop(responder.clone(), evaluator);

        chat.handle("Where do you work?", &[]).await.unwrap();

        assert!(!responder.system_prompts()[0].contains(PIG_LATIN_MARKER));
    }

    #[tokio::test]
    async fn test_rerun_prompt_drops_style_directive() {
        let responder = Arc::new(StubResponder::replying(&["R1", "R2"]));
        let evaluator = Arc::new(StubEvaluator::verdict(false, "wrong register"));
        let chat = chat_loop(responder.clone(), evaluator);

        chat.handle("patent question", &[]).await.unwrap();

        let systems = responder.system_prompts();
        assert!(systems[0].contains(PIG_LATIN_MARKER));
        assert!(!systems[1].contains(PIG_LATIN_MARKER));
        let expected_prefix = format!(
            "{}\n\n{}",
            build_responder_system_prompt(&persona()),
            REJECTION_HEADING
        );
        assert!(systems[1].starts_with(&expected_prefix));
    }

    #[tokio::test]
    async fn test_evaluator_sees_reply_message_and_history() {
        let responder = Arc::new(StubResponder::replying(&["R1"]));
        let evaluator = Arc::new(StubEvaluator::verdict(true, "ok"));
        let chat = chat_loop(responder, evaluator.clone());
        let history = vec![Message::user("hi"), Message::assistant("hello")];

        chat.handle("what now?", &history).await.unwrap();

        assert_eq!(
            evaluator.judged(),
            vec![("R1".to_string(), "what now?".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_responder_failure_propagates_without_evaluation() {
        let responder = Arc::new(StubResponder::new(vec![Err(AppError::Upstream(
            LlmError::NoChoices,
        ))]));
        let evaluator = Arc::new(StubEvaluator::verdict(true, "ok"));
        let chat = chat_loop(responder, evaluator.clone());

        let err = chat.handle("hi", &[]).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_evaluation_is_fatal_for_the_turn() {
        let responder = Arc::new(StubResponder::replying(&["R1", "R2"]));
        let evaluator = Arc::new(StubEvaluator::new(vec![Err(AppError::MalformedEvaluation(
            "missing field `feedback`".to_string(),
        ))]));
        let chat = chat_loop(responder.clone(), evaluator);

        let err = chat.handle("hi", &[]).await.unwrap_err();

        assert!(matches!(err, AppError::MalformedEvaluation(_)));
        assert_eq!(responder.calls(), 1);
    }

    #[tokio::test]
    async fn test_rerun_failure_propagates() {
        let responder = Arc::new(StubResponder::new(vec![
            Ok("R1".to_string()),
            Err(AppError::Upstream(LlmError::EmptyContent)),
        ]));
        let evaluator = Arc::new(StubEvaluator::new(vec![Ok(Evaluation::new(false, "bad"))]));
        let chat = chat_loop(responder, evaluator);

        let err = chat.handle("hi", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(LlmError::EmptyContent)));
    }
}
