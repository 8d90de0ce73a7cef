//! Generative agent integration: prompt construction and a client that
//! drives an agent CLI through [`crate::external::CommandExecutor`].

pub mod client;
pub mod prompt;

pub use client::{extract_code_block, extract_json_object, CommandAgentClient};
pub use prompt::{render_code_prompt, story_script_prompt, SCRIPT_VERSION};
