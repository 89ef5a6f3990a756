mod cli;
mod commands;
mod render;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use dayplan::logging::{init_logging, resolve_level};
use dayplan::{storage, Config};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let log_dir = storage::data_dir()?.join("logs");
    init_logging(&resolve_level(config.log_level.as_deref()), &log_dir)?;

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init { name } => commands::init(name),
        cli::Command::Add {
            title,
            start,
            duration,
            tags,
        } => commands::add(&config, title, start, duration, tags),
        cli::Command::List => commands::list(&config),
        cli::Command::Remove { task_id } => commands::remove(task_id),
        cli::Command::Done { task_id, undo } => commands::done(task_id, undo),
        cli::Command::Timeline { clock } => commands::timeline(&config, clock),
        cli::Command::Suggest => commands::suggest_activities(),
        cli::Command::Analyze => commands::analyze(),
        cli::Command::Mood { task_id, level } => commands::mood(task_id, level),
        cli::Command::Moods => commands::moods(&config),
        cli::Command::Todo { action } => commands::todo(action),
        cli::Command::Tui => commands::tui(config),
    }
}
