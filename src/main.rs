use anyhow::{Context, Result};
use bottlepour::config::{load_settings, project_paths, save_settings_atomic, Args, Config, Settings};
use clap::Parser;
use log::info;
use std::fs::OpenOptions;
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths()?;

    init_logging(args.log_file.as_deref().unwrap_or(&paths.log_path))?;

    let settings_path = match &args.config {
        Some(p) => p.clone(),
        None => {
            if !paths.settings_path.exists() {
                save_settings_atomic(&paths.settings_path, &Settings::default())
                    .context("writing default settings")?;
            }
            paths.settings_path
        }
    };
    let settings = load_settings(&settings_path).merge(&args);
    let config = Config::from(settings);
    info!("starting with {config:?}");

    bottlepour::app::run(config)
}

/// The terminal belongs to the renderer, so log lines go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
