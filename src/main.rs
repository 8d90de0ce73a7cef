use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use storyreel::cli::commands::{Command, InitCommand, RunCommand, ValidateCommand};
use storyreel::cli::{Cli, Commands};
use storyreel::config::StoryReelConfig;
use storyreel::fs::StandardFileSystem;

fn main() -> Result<()> {
    let cli = Cli::parse();
    StoryReelConfig::load_env_file()?;

    match cli.command {
        // Default behavior: no subcommand - explain how to get started
        None => {
            show_getting_started();
            Ok(())
        }
        Some(Commands::Run {
            source_dir,
            config,
            output,
            style,
            prompt,
            mode,
            max_retries,
        }) => tokio::runtime::Runtime::new()?.block_on(async {
            RunCommand::new(source_dir, mode)
                .with_config_path(config)
                .with_output(output)
                .with_style(style, prompt)
                .with_max_retries(max_retries)
                .execute()
                .await
        }),
        Some(Commands::Validate {
            script,
            duration,
            min_segment,
            allow_unused_assets,
        }) => tokio::runtime::Runtime::new()?.block_on(async {
            ValidateCommand::new(script)
                .with_duration(duration)
                .with_min_segment(min_segment)
                .with_allow_unused_assets(allow_unused_assets)
                .execute()
                .await
        }),
        Some(Commands::Init { force }) => tokio::runtime::Runtime::new()?.block_on(async {
            InitCommand::new(force, Arc::new(StandardFileSystem)).execute().await
        }),
    }
}

fn show_getting_started() {
    println!("🎞️  STORYREEL - photos in, narrated video out");
    println!("=============================================");
    println!();
    println!("🚀 Render a folder of photos:");
    println!("   storyreel run ./photos");
    println!();
    println!("🧭 Choose render modes yourself:");
    println!("   storyreel run ./photos --mode ask");
    println!();
    println!("🔍 Check a story script by hand:");
    println!("   storyreel validate output/<run-id>/story-script.json");
    println!();
    println!("⚙️  Write a config file with every default:");
    println!("   storyreel init");
}
