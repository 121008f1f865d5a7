//! vnpatch CLI - translate a visual novel's scripts and repack them.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use vnpatch::config::Config;
use vnpatch::console::Console;
use vnpatch::packager::Packager;
use vnpatch::pipeline::{self, Pipeline};
use vnpatch::GoogleBackend;

/// Translate visual novel scripts while keeping their markup intact.
#[derive(Parser, Debug)]
#[command(name = "vnpatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with the extracted game files.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory receiving the translated tree.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Target language code (e.g. "es", "en").
    #[arg(long)]
    lang: Option<String>,

    /// Number of files processed concurrently.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    workers: Option<u32>,

    /// Skip the packaging step.
    #[arg(long)]
    no_pack: bool,
}

impl Args {
    /// Applies command-line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.paths.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output = output.clone();
        }
        if let Some(lang) = &self.lang {
            config.translation.target_language = lang.clone();
        }
        if let Some(workers) = self.workers {
            config.translation.workers = workers as usize;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let console = Console::new();
    let started = Instant::now();

    console.section("vnpatch - Visual Novel Script Translator");

    // Load configuration
    console.step("Loading configuration...");
    let mut config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    console.success("Configuration loaded");

    let backend = GoogleBackend::new(&config.translation)
        .context("Failed to set up translation backend")?;

    let summary = Pipeline::execute(&config, Arc::new(backend), console)
        .await
        .context("Translation run aborted")?;
    pipeline::print_summary(&console, &summary, started.elapsed());

    if args.no_pack {
        console.info("Packaging skipped (--no-pack)");
    } else {
        package(&config, &console);
    }

    console.section("Done!");
    Ok(())
}

/// Runs the external packager if one is configured and present.
fn package(config: &Config, console: &Console) {
    let packager = match Packager::from_config(&config.packaging) {
        Ok(Some(packager)) => packager,
        Ok(None) => {
            console.info(&format!(
                "Packager {} not found, skipping packaging",
                config.packaging.script.display()
            ));
            return;
        }
        Err(e) => {
            console.error(&format!("Cannot run packager: {}", e));
            return;
        }
    };

    console.step(&format!("Packing {}...", packager.archive()));
    match packager.package(&config.paths.output) {
        Ok(()) => console.success(&format!("Created {}", packager.archive())),
        Err(e) => console.error(&format!("Packaging failed: {}", e)),
    }
}
