// Prompt rendering for the responder and the evaluator.
// Pure functions: rebuilt on every turn so the rerun path can extend them.

use crate::models::message::Message;
use crate::persona::PersonaContext;

/// Heading that opens the rejection block in a rerun system prompt.
pub const REJECTION_HEADING: &str = "## Previous answer rejected";

/// Rendered in place of an empty history so the evaluator never sees a blank section.
const EMPTY_HISTORY: &str = "(no earlier messages)";

/// System prompt for the persona the responder plays.
pub fn build_responder_system_prompt(persona: &PersonaContext) -> String {
    let name = persona.name();
    format!(
        "You are acting as {name}. You are answering questions on {name}'s website, \
        particularly questions related to {name}'s career, background, skills and experience. \
        Your responsibility is to represent {name} for interactions on the website as faithfully as possible. \
        You are given a summary of {name}'s background and LinkedIn profile which you can use to answer questions. \
        Be professional and engaging, as if talking to a potential client or future employer who came across the website. \
        If you don't know the answer, say so.\n\n\
        ## Summary:\n{summary}\n\n\
        ## LinkedIn Profile:\n{profile}\n\n\
        With this context, please chat with the user, always staying in character as {name}.",
        summary = persona.summary(),
        profile = persona.profile(),
    )
}

/// System prompt for the grader that judges the responder's latest reply.
pub fn build_evaluator_system_prompt(persona: &PersonaContext) -> String {
    let name = persona.name();
    format!(
        "You are an evaluator that decides whether a response to a question is acceptable. \
        You are provided with a conversation between a User and an Agent. \
        Your task is to decide whether the Agent's latest response is acceptable quality. \
        The Agent is playing the role of {name} and is representing {name} on their website. \
        The Agent has been instructed to be professional and engaging, as if talking to a potential client or future employer who came across the website. \
        The Agent has been provided with context on {name} in the form of their summary and LinkedIn details. \
        Here's the information:\n\n\
        ## Summary:\n{summary}\n\n\
        ## LinkedIn Profile:\n{profile}\n\n\
        With this context, please evaluate the latest response, \
        replying with whether the response is acceptable and your feedback.",
        summary = persona.summary(),
        profile = persona.profile(),
    )
}

/// User-turn prompt handed to the evaluator: the transcript, the question and the candidate reply.
pub fn build_evaluator_user_prompt(reply: &str, message: &str, history: &[Message]) -> String {
    format!(
        "Here's the conversation between the User and the Agent: \n\n{history}\n\n\
        Here's the latest message from the User: \n\n{message}\n\n\
        Here's the latest response from the Agent: \n\n{reply}\n\n\
        Please evaluate the response, replying with whether it is acceptable and your feedback.",
        history = render_transcript(history),
    )
}

/// Base prompt extended with the rejected attempt and the grader's reason, verbatim.
pub fn build_rerun_system_prompt(base: &str, rejected_reply: &str, feedback: &str) -> String {
    format!(
        "{base}\n\n{REJECTION_HEADING}\n\
        You just tried to reply, but the quality control rejected your reply\n\
        ## Your attempted answer:\n{rejected_reply}\n\n\
        ## Reason for rejection:\n{feedback}\n\n"
    )
}

/// Renders history as `Speaker: content` lines in chronological order.
pub fn render_transcript(history: &[Message]) -> String {
    if history.is_empty() {
        return EMPTY_HISTORY.to_string();
    }
    history
        .iter()
        .map(|m| format!("{}: {}", m.role.speaker(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
