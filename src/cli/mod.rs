use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod interactive;

#[derive(Parser)]
#[command(name = "storyreel")]
#[command(version)]
#[command(about = "Turn a folder of photos into a short narrated video")]
#[command(long_about = "StoryReel asks a generative agent for a timed story script covering your photos, \
                       validates it, and renders it into a vertical video. Get started with \
                       'storyreel run <photo-folder>'.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a story script for a photo folder and render it to video
    Run {
        /// Directory containing jpg, jpeg, png or webp photos
        source_dir: PathBuf,
        /// Configuration file (defaults to ./storyreel.toml when present)
        #[arg(long, help = "Path to a storyreel.toml configuration file")]
        config: Option<PathBuf>,
        /// Root directory for run output
        #[arg(long, help = "Directory under which the run directory is created")]
        output: Option<PathBuf>,
        /// Visual style preset
        #[arg(long, help = "Style preset passed to the agent, e.g. cinematic")]
        style: Option<String>,
        /// Free-form style guidance
        #[arg(long, help = "Extra style guidance for the narration")]
        prompt: Option<String>,
        /// How render modes are chosen
        #[arg(long, value_enum, default_value_t = ModeArg::Auto, help = "Render mode selection")]
        mode: ModeArg,
        /// Retries after the first generation attempt
        #[arg(long, help = "Story script generation retries after the first attempt")]
        max_retries: Option<u32>,
    },
    /// Validate a story script JSON file
    Validate {
        /// Story script to check
        script: PathBuf,
        /// Expected total duration in seconds
        #[arg(long, help = "Expected total timeline duration in seconds")]
        duration: Option<f64>,
        /// Minimum duration of each timeline segment in seconds
        #[arg(long, help = "Minimum duration of each timeline segment in seconds")]
        min_segment: Option<f64>,
        /// Do not require every declared asset to appear in the timeline
        #[arg(long, help = "Allow declared assets that never appear in the timeline")]
        allow_unused_assets: bool,
    },
    /// Write a storyreel.toml with default settings
    Init {
        /// Overwrite an existing storyreel.toml
        #[arg(long, help = "Overwrite an existing configuration file")]
        force: bool,
    },
}

/// Render mode selection for `storyreel run`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Ask before every render attempt
    Ask,
    /// Start with the template renderer and fall back to generated code
    Auto,
    /// Start with the template renderer
    Template,
    /// Start with agent-generated render code
    AiCode,
}
