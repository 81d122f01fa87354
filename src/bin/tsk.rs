// Interactive menu front-end over the tsk supervisor core

use anyhow::Result;
use clap::Parser;
use console::Term;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tsk::config;
use tsk::menu::{self, Selection};
use tsk::registry::SupervisorRegistry;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "tsk", version, about = "Interactive manager for a fixed set of processes")]
struct Args {
    /// Path to the configuration file
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args
        .config
        .map(config::expand_user)
        .unwrap_or_else(config::default_config_path);

    let cfg = config::load_or_create(&config_path)?;
    tsk::util::logging::init(&cfg.log_level);
    info!("Configuration loaded from {}", config_path.display());

    let log_dir = config::prepare_log_dir(&cfg)?;

    if cfg.processes.is_empty() {
        println!("No processes to manage.");
        return Ok(());
    }

    let mut registry = SupervisorRegistry::new(cfg.processes, &log_dir, cfg.log_archive);

    let term = Term::stdout();
    let outcome = tokio::select! {
        result = run_menu(&term, &mut registry, &config_path, &log_dir) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    // Whatever happened above, no child process is left behind.
    registry.shutdown_all().await;

    outcome
}

async fn run_menu(
    term: &Term,
    registry: &mut SupervisorRegistry,
    config_path: &Path,
    log_dir: &Path,
) -> Result<()> {
    // Single-key selection only works while every entry fits one digit.
    let line_mode = registry.len() > 9;

    loop {
        term.clear_screen()?;
        term.write_str(&menu::render(registry))?;
        term.write_str("\nSelect a process to stop or start: ")?;

        let input = read_input(term, line_mode).await?;

        match menu::parse_selection(&input) {
            Selection::Quit => return Ok(()),
            Selection::OpenConfig => {
                if let Err(e) = open::that(config_path) {
                    warn!("Could not open {}: {}", config_path.display(), e);
                }
            }
            Selection::OpenLogs => {
                if let Err(e) = open::that(log_dir) {
                    warn!("Could not open {}: {}", log_dir.display(), e);
                }
            }
            Selection::Entry(index) => {
                let Ok(supervisor) = registry.get_mut(index) else {
                    // Out-of-range selection: just redraw.
                    continue;
                };
                let name = supervisor.name().to_string();
                let cmd = supervisor.spec().cmd.clone();
                match supervisor.toggle().await {
                    Ok(()) => {
                        // Let the operator see the new status before redrawing.
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                    Err(e) => {
                        term.write_line(&format!(
                            "\nError toggling {} (\"{}\"):\n{}",
                            name, cmd, e
                        ))?;
                        term.write_line("\nPress any key to continue.")?;
                        let _ = read_input(term, false).await?;
                    }
                }
            }
            Selection::Unknown => {}
        }
    }
}

/// Read one menu selection without blocking the runtime; single keystroke
/// unless `line_mode` or stdin is not a terminal
async fn read_input(term: &Term, line_mode: bool) -> Result<String> {
    let term = term.clone();
    let input = tokio::task::spawn_blocking(move || {
        if line_mode || !term.is_term() {
            term.read_line()
        } else {
            term.read_char().map(String::from)
        }
    })
    .await??;
    Ok(input)
}
