//! Guided tour demo - main entry point
//!
//! Runs a tour over a small terminal screen, prints a tour's step plan, or
//! clears its remembered seen-state.

use anyhow::{Context, Result};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use guided_tour::app::{App, demo};
use guided_tour::cli::{Cli, Commands};
use guided_tour::{
    FileStorage, GuidedTour, Page, Scheduler, StorageAdapter, TourDefinition, TourEngine, TourEnv,
    UnsupportedUserData,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::File;
use std::io::stdout;
use std::path::Path;
use std::rc::Rc;
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Initialize logging. The TUI owns the terminal, so without a log file
/// nothing is written while it runs.
fn init_logging(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {:?}", path))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        None if !interactive => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn build_env(state_file: &Path) -> TourEnv {
    // Terminals have no per-user data API; the first access falls back to the state file.
    let storage = StorageAdapter::new(
        "guided-tour",
        Some(Box::new(UnsupportedUserData)),
        Some(Box::new(FileStorage::new(state_file))),
    );
    TourEnv::new(Rc::new(Page::new()), Scheduler::new(), storage)
}

fn load_definition(cli: &Cli) -> Result<TourDefinition> {
    match &cli.tour {
        Some(path) => {
            info!("Loading tour definition: {:?}", path);
            TourDefinition::load_from_file(path)
        }
        None => Ok(demo::demo_definition()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let command = cli.command.clone().unwrap_or(Commands::Run { force: false });
    init_logging(cli.log_file.as_deref(), matches!(command, Commands::Run { .. }))?;
    info!("Guided tour starting up");

    let definition = load_definition(&cli)?;
    let env = build_env(&cli.state_file);

    match command {
        Commands::Run { force } => run_tui(env, &definition, force),
        Commands::Plan => print_plan(&env, &definition),
        Commands::Reset => {
            let tour: GuidedTour = definition.build(&env)?;
            match tour.options().id.as_deref() {
                Some(id) => {
                    tour.forget_seen();
                    println!("✓ Tour '{}' will start again next time", id);
                }
                None => println!("Tour has no id; nothing is remembered for it"),
            }
            Ok(())
        }
    }
}

/// Print the computed buttons and markers of every step
fn print_plan(env: &TourEnv, definition: &TourDefinition) -> Result<()> {
    let tour: GuidedTour = definition.build(env)?;
    let engine = tour.engine();
    println!(
        "Tour {} ({} steps)",
        tour.options().id.as_deref().unwrap_or("<no id>"),
        engine.step_count()
    );
    for index in 0..engine.step_count() {
        let Some(step) = engine.step(index) else {
            continue;
        };
        let buttons: Vec<String> = step
            .buttons
            .iter()
            .map(|b| format!("{} → {}", b.label, b.action))
            .collect();
        println!(
            "  {:>2}. {:<12} {:<10} [{}]  classes: {}",
            index + 1,
            step.id,
            step.position,
            buttons.join(", "),
            step.classes.join(" ")
        );
        if let Some(attach) = &step.attach_to {
            println!("      target: {} ({})", attach.element, attach.on);
        }
    }
    Ok(())
}

/// Run the interactive demo
fn run_tui(env: TourEnv, definition: &TourDefinition, force: bool) -> Result<()> {
    debug!("Initializing terminal");
    let mut app = App::new(env, definition)?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    crossterm::execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout());
    let result = Terminal::new(backend)
        .context("Failed to create terminal")
        .and_then(|mut terminal| {
            app.start(force);
            app.run(&mut terminal)
        });

    // Cleanup terminal (always attempt cleanup, even if app failed)
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture);

    result
}
