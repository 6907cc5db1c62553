//! The LLM Client: a bounded request surface with a response cache,
//! usage/cost metering, and a deterministic mock mode.
//!
//! Enum-dispatched backends, `rust_decimal`-based cost accounting, and
//! `minijinja` prompt rendering. This crate knows nothing about the simulation's world
//! model -- `village-core`'s Action Decider assembles a [`prompt::PromptContext`]
//! from `Agent`/`Needs`/`Goal`/`Memory` data, calls [`prompt::build_prompt`],
//! sends the result through [`client::LlmClient::complete`], and hands the
//! raw text to [`parse::parse_action_line`] to recover an `ACTION:` line.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod llm;
pub mod mock;
pub mod parse;
pub mod prompt;
pub mod usage;

pub use client::{LlmClient, Response};
pub use error::LlmError;
pub use parse::{parse_action_line, DecodedAction};
pub use prompt::{build_prompt, PromptContext, RenderedPrompt};
