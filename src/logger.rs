// ══════════════════════════════════════════════════════════════════════════════
// LOGGER MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Provides colored, timestamped console logging with different severity levels.
// Used throughout the application to provide clear user feedback during operations.
// Debug lines only show up in verbose mode. When a log file is configured every
// line is also appended there, uncolored and with the full date.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};
use colored::*;
use chrono::Local;

static VERBOSE: AtomicBool = AtomicBool::new(false);
static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

pub enum LogLevel {
	Debug,
	Info,
	Success,
	Warning,
	Error,
}

impl LogLevel {
	fn label(&self) -> &'static str {
		match self {
			LogLevel::Debug => "DEBUG",
			LogLevel::Info => "INFO",
			LogLevel::Success => "SUCCESS",
			LogLevel::Warning => "WARNING",
			LogLevel::Error => "ERROR",
		}
	}
}

/// Configures verbosity and the optional log file. Safe to call more than once;
/// only the first log file wins.
pub fn init(verbose: bool, log_file: Option<&Path>) -> std::io::Result<()> {
	VERBOSE.store(verbose, Ordering::Relaxed);
	if let Some(path) = log_file {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let file = OpenOptions::new().create(true).append(true).open(path)?;
		let _ = LOG_FILE.set(Mutex::new(file));
	}
	Ok(())
}

pub fn is_verbose() -> bool {
	VERBOSE.load(Ordering::Relaxed)
}

pub fn log(level: LogLevel, message: &str) {
	if let Some(file) = LOG_FILE.get() {
		if let Ok(mut file) = file.lock() {
			let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
			let _ = writeln!(file, "{} [{}] {}", stamp, level.label(), message);
		}
	}

	if matches!(level, LogLevel::Debug) && !is_verbose() {
		return;
	}

	let timestamp = Local::now().format("%H:%M:%S").to_string();
	let prefix = match level {
		LogLevel::Debug => "· ".dimmed(),
		LogLevel::Info => "𝒊 ".blue().bold(),
		LogLevel::Success => "✔ ".green().bold(),
		LogLevel::Warning => "⚠ ".yellow().bold(),
		LogLevel::Error => "✘ ".red().bold(),
	};

	match level {
		LogLevel::Warning | LogLevel::Error => eprintln!("[{}] {} {}", timestamp.dimmed(), prefix, message),
		_ => println!("[{}] {} {}", timestamp.dimmed(), prefix, message),
	}
}
