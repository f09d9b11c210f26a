//! Connect banner

use super::command_names;
use crate::types::{OutputLine, ServerIdentity, SystemProfile};
use chrono::{DateTime, Local};

const TITLE: &str = "VPS MANAGER - SSH TERMINAL";
const BOX_WIDTH: usize = 56;

/// Lines written to the scrollback once the session is connected
///
/// The trailing prompt is not part of the banner; the terminal appends
/// it like after any other command.
pub fn banner(
    identity: &ServerIdentity,
    profile: &SystemProfile,
    now: DateTime<Local>,
) -> Vec<OutputLine> {
    let metrics = identity.metrics();
    let region = if identity.region.is_empty() {
        "unknown"
    } else {
        identity.region.as_str()
    };

    let mut lines = vec![
        OutputLine::info(format!("╔{}╗", "═".repeat(BOX_WIDTH))),
        OutputLine::info(format!("║{:^width$}║", TITLE, width = BOX_WIDTH)),
        OutputLine::info(format!("╚{}╝", "═".repeat(BOX_WIDTH))),
        OutputLine::blank(),
        OutputLine::info(format!("Connecting to {}...", identity.address())),
        OutputLine::success(format!(
            "✓ Connection established ({}@{})",
            identity.username, identity.host
        )),
        OutputLine::success(format!(
            "Welcome to {} ({})",
            identity.name,
            identity.provider.display_name()
        )),
        OutputLine::info(format!(
            "Last login: {}",
            now.format("%a %b %e %H:%M:%S %Y")
        )),
        OutputLine::blank(),
        OutputLine::info("System Metrics:"),
        OutputLine::data(format!("  CPU Usage:    {}%", metrics.cpu_percent)),
        OutputLine::data(format!("  Memory Usage: {}%", metrics.memory_percent)),
        OutputLine::data(format!("  Disk Usage:   {}%", metrics.disk_percent)),
        OutputLine::data(format!("  Uptime:       {} hours", metrics.uptime_hours)),
        OutputLine::blank(),
        OutputLine::info("System Information:"),
        OutputLine::data(format!("  OS:       {}", profile.pretty_name())),
        OutputLine::data(format!("  Kernel:   {}", profile.kernel)),
        OutputLine::data(format!("  Hostname: {}", profile.hostname)),
        OutputLine::data(format!(
            "  CPU:      {} ({} cores)",
            profile.cpu_model, profile.cpu_cores
        )),
        OutputLine::data(format!("  Memory:   {} GB", profile.memory_gb)),
        OutputLine::data(format!("  Disk:     {} GB", profile.disk_gb)),
        OutputLine::data(format!("  Provider: {}", identity.provider.display_name())),
        OutputLine::data(format!("  Region:   {}", region)),
        OutputLine::blank(),
    ];

    let names: Vec<&str> = command_names().collect();
    lines.push(OutputLine::info(format!(
        "Available commands: {}",
        names.join(", ")
    )));
    lines.push(OutputLine::blank());
    lines
}
