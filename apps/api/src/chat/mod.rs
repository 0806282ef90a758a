// Persona chat: prompt rendering, responder, evaluator and the control loop
// that ties them together. All model calls go through llm_client.

pub mod control_loop;
pub mod evaluator;
pub mod handlers;
pub mod policy;
pub mod prompts;
pub mod responder;

#[cfg(test)]
pub(crate) mod testing;

pub use control_loop::ChatLoop;
