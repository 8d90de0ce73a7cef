use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::story_script::{GenerationConstraints, Style};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "storyreel.toml";

/// Main configuration structure for StoryReel
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoryReelConfig {
    /// Generative agent invocation
    pub agent: AgentConfig,
    /// Story script generation settings
    pub generation: GenerationConfig,
    /// Input photo collection
    pub intake: IntakeConfig,
    /// Video settings requested from the agent
    pub video: VideoConfig,
    /// Default visual style
    pub style: StyleConfig,
    /// Render strategies
    pub render: RenderConfig,
    /// Where run directories are created
    pub output: OutputConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentConfig {
    /// Agent CLI; the prompt is written to its stdin
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Expected total video duration in seconds
    pub duration_sec: f64,
    /// Minimum duration of each timeline segment
    pub min_duration_per_asset_sec: f64,
    /// Every input photo must appear in the timeline
    pub require_all_assets_used: bool,
}

impl GenerationConfig {
    pub fn constraints(&self) -> GenerationConstraints {
        GenerationConstraints {
            duration_sec: self.duration_sec,
            min_duration_per_asset_sec: self.min_duration_per_asset_sec,
            require_all_assets_used: self.require_all_assets_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IntakeConfig {
    /// Maximum number of photos accepted per run
    pub max_images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StyleConfig {
    pub preset: String,
    pub prompt: Option<String>,
}

impl StyleConfig {
    pub fn to_style(&self) -> Style {
        Style {
            preset: self.preset.clone(),
            prompt: self.prompt.clone(),
        }
    }
}

/// An external program with `{script}`, `{output}` and `{code}` placeholders
/// in its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandConfig {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenderConfig {
    /// File name of the rendered video inside the run directory
    pub video_file_name: String,
    pub template: CommandConfig,
    pub code: CodeRenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CodeRenderConfig {
    /// Name of the generated source file
    pub entry_file: String,
    /// Run inside the generated code directory
    pub compile: CommandConfig,
    /// Run inside the generated code directory after a successful compile
    pub render: CommandConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OutputConfig {
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,
    /// `json` or `pretty`
    pub log_format: String,
}

impl Default for StoryReelConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig {
                program: "claude".to_string(),
                args: vec![
                    "-p".to_string(),
                    "--output-format".to_string(),
                    "text".to_string(),
                ],
            },
            generation: GenerationConfig {
                max_retries: 2,
                duration_sec: 30.0,
                min_duration_per_asset_sec: 1.0,
                require_all_assets_used: true,
            },
            intake: IntakeConfig { max_images: 20 },
            video: VideoConfig {
                width: 1080,
                height: 1920,
                fps: 30,
            },
            style: StyleConfig {
                preset: "cinematic".to_string(),
                prompt: None,
            },
            render: RenderConfig {
                video_file_name: "video.mp4".to_string(),
                template: CommandConfig {
                    program: "npx".to_string(),
                    args: vec![
                        "remotion".to_string(),
                        "render".to_string(),
                        "PhotoStory".to_string(),
                        "{output}".to_string(),
                        "--props={script}".to_string(),
                    ],
                },
                code: CodeRenderConfig {
                    entry_file: "Story.tsx".to_string(),
                    compile: CommandConfig {
                        program: "npx".to_string(),
                        args: vec![
                            "tsc".to_string(),
                            "--noEmit".to_string(),
                            "--jsx".to_string(),
                            "react-jsx".to_string(),
                            "Story.tsx".to_string(),
                        ],
                    },
                    render: CommandConfig {
                        program: "npx".to_string(),
                        args: vec![
                            "remotion".to_string(),
                            "render".to_string(),
                            "{code}/Story.tsx".to_string(),
                            "{output}".to_string(),
                            "--props={script}".to_string(),
                        ],
                    },
                },
            },
            output: OutputConfig {
                root_dir: PathBuf::from("output"),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: "json".to_string(),
            },
        }
    }
}

impl StoryReelConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`storyreel.toml`, or `path` when given)
    /// 3. Environment variables (prefixed with STORYREEL__)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = toml::to_string(&Self::default()).context("failed to serialize default configuration")?;
        let mut builder = Config::builder().add_source(File::from_str(&defaults, FileFormat::Toml));

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        // Override with environment variables, e.g. STORYREEL__GENERATION__MAX_RETRIES=4
        builder = builder.add_source(
            Environment::with_prefix("STORYREEL")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let storyreel_config: StoryReelConfig = config.try_deserialize()?;
        Ok(storyreel_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<StoryReelConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = StoryReelConfig::load_env_file();
        StoryReelConfig::load(None)
    });

/// Get the global configuration
pub fn config() -> Result<&'static StoryReelConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
