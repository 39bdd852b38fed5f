//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - The prompt I/O seam: terminal and scripted implementations
//! - [`output`] - Output formats, record/list/preview rendering
//!
//! # Design
//!
//! The engine never touches the terminal directly. Questions go through
//! [`prompts::PromptIo`] and results come back as values the CLI hands to
//! [`output`], so both halves can be exercised without a TTY.

pub mod output;
pub mod prompts;
