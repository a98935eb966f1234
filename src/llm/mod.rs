//! Prompt hand-off to an external recommendation generator

pub mod prompts;
