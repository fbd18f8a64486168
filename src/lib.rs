//! Issuegen: template-driven document generation with a local LLM
//!
//! Fills the `{{ placeholder }}` fields of an epic, story, use-case or documentation
//! template one at a time. Each field is bound to a generation strategy in a prompt
//! catalog; the model's answer is normalized for that strategy and substituted
//! into the template.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod logging;
pub mod normalize;
pub mod prompts;
pub mod provider;
pub mod strategy;
pub mod template;
