//! Core of the operator self-service agent: the operation registry, the
//! action parser, conversation sessions and the dispatcher that ties them to
//! a language model.

pub mod action;
pub mod agent;
pub mod config;
pub mod error;
pub mod operation;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod tests;

pub use teleagent_llm as llm;
