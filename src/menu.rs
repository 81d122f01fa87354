//! Menu rendering and selection parsing for the interactive front-end
//!
//! Everything here is pure string work; the binary owns the terminal. The
//! table lists each process with its 1-based index, current status, and
//! log file, followed by the fixed configuration/logs/quit entries.

use std::fmt::Write;

use crate::registry::SupervisorRegistry;

/// What the operator picked from the menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Leave the program
    Quit,
    /// Open the configuration file
    OpenConfig,
    /// Open the log directory
    OpenLogs,
    /// Toggle the process at this 1-based index
    Entry(usize),
    /// Anything else; ignored, the menu redraws
    Unknown,
}

/// Interpret raw menu input, case-insensitively
pub fn parse_selection(input: &str) -> Selection {
    let input = input.trim();
    match input.to_lowercase().as_str() {
        "q" => Selection::Quit,
        "c" => Selection::OpenConfig,
        "l" => Selection::OpenLogs,
        other => match other.parse::<usize>() {
            Ok(index) => Selection::Entry(index),
            Err(_) => Selection::Unknown,
        },
    }
}

/// Render the status table for the current registry snapshot
pub fn render(registry: &SupervisorRegistry) -> String {
    let index_width = registry.len().max(1).to_string().len();
    let name_width = column_width(registry.all().map(|s| s.name().len()), 15);
    let status_width = column_width(
        registry.all().map(|s| s.status().to_string().len()),
        "STATUS".len(),
    );
    let log_width = column_width(
        registry
            .all()
            .map(|s| s.log_file().map_or(0, |p| p.to_string_lossy().len())),
        "LOG FILE".len(),
    );

    let mut out = String::new();
    let _ = writeln!(out, "TSK PROCESS MANAGER\n");
    let _ = writeln!(
        out,
        "{:iw$}  {:nw$}   {:sw$}   {:lw$}",
        "",
        "PROCESS",
        "STATUS",
        "LOG FILE",
        iw = index_width,
        nw = name_width,
        sw = status_width,
        lw = log_width,
    );

    for (i, supervisor) in registry.all().enumerate() {
        let log = supervisor
            .log_file()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{:>iw$}: {:nw$}   {:sw$}   {:lw$}",
            i + 1,
            supervisor.name(),
            supervisor.status().to_string(),
            log,
            iw = index_width,
            nw = name_width,
            sw = status_width,
            lw = log_width,
        );
    }

    let _ = writeln!(out, "\n{:>iw$}: View Configuration", "C", iw = index_width);
    let _ = writeln!(out, "{:>iw$}: View Logs", "L", iw = index_width);
    let _ = writeln!(out, "{:>iw$}: Quit", "Q", iw = index_width);

    out
}

fn column_width<I: Iterator<Item = usize>>(items: I, min: usize) -> usize {
    items.fold(min, usize::max)
}
