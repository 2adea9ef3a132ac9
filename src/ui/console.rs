//! Terminal implementations of the interactive capabilities.

use crate::resolver::host::{Notifier, ProcessPicker};
use crate::resolver::protocol::is_node_process;
use crate::resolver::Pid;
use crossterm::style::Stylize;
use itertools::Itertools;
use std::io::{self, BufRead, Write};
use sysinfo::{RefreshKind, System};

/// Process shown in a pick list.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProcessItem {
    pub pid: Pid,
    pub command: String,
}

/// List running Node.js processes ordered by pid.
pub fn node_processes() -> Vec<ProcessItem> {
    let sys = System::new_with_specifics(RefreshKind::everything().without_cpu().without_memory());

    sys.processes()
        .iter()
        .filter(|(_, process)| is_node_process(process))
        .map(|(pid, process)| ProcessItem {
            pid: pid.as_u32(),
            command: process.cmd().join(" "),
        })
        .sorted_by_key(|item| item.pid)
        .dedup_by(|a, b| a.pid == b.pid)
        .collect()
}

/// Turn user input into a pid string: a list position selects a listed process,
/// anything else is passed through as is. Empty input cancels.
fn choose(items: &[ProcessItem], input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match input.parse::<usize>() {
        Ok(n) if (1..=items.len()).contains(&n) => Some(items[n - 1].pid.to_string()),
        _ => Some(input.to_string()),
    }
}

/// Picks a process from a list printed into stderr, reads a choice from stdin.
#[derive(Default, Clone, Copy)]
pub struct ConsolePicker;

impl ProcessPicker for ConsolePicker {
    fn pick(&self) -> anyhow::Result<Option<String>> {
        let items = node_processes();

        let mut out = io::stderr().lock();
        if items.is_empty() {
            writeln!(out, "{}", "no Node.js processes found".dark_grey())?;
        }
        for (i, item) in items.iter().enumerate() {
            writeln!(out, "{:>3}) {:>8}  {}", i + 1, item.pid, item.command)?;
        }
        write!(out, "pick a process (list number or pid, empty to cancel): ")?;
        out.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(choose(&items, &line))
    }
}

/// Prints messages into stderr.
#[derive(Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, modal: bool) {
        if modal {
            eprintln!("{} {message}", "error:".red().bold());
        } else {
            eprintln!("{} {message}", "warning:".yellow());
        }
    }
}
