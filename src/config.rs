// ══════════════════════════════════════════════════════════════════════════════
// CONFIG MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Run settings, read once from a TOML file (default ~/.podcasttool/config.toml)
// and never reloaded. Every field has a default, so a missing file is fine.
// Command-line flags override individual fields after loading.

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::audio::{OutputFormat, WorkingFormat};
use crate::constants::*;
use crate::error::{PodcastError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
	/// Catalog JSON with courses, teachers, intro template and watermark.
	pub catalog: PathBuf,
	/// Shipped clip directories, scanned before the overlay.
	pub library_dirs: Vec<PathBuf>,
	/// User-writable clip directory; synthesized clips land here.
	pub overlay_dir: PathBuf,
	/// Where landing pages are archived.
	pub archive_dir: PathBuf,
	pub log_file: Option<PathBuf>,

	pub podcast_url: String,
	pub test_url: String,
	/// Local directory mirroring the server; uploads are only logged when unset.
	pub upload_root: Option<PathBuf>,
	pub html_mediaplayer: bool,
	pub plugin_url: String,

	pub format: OutputFormat,
	pub bitrate: String,
	pub sample_rate: u32,
	pub channels: u16,
	pub ffmpeg: PathBuf,

	pub synthesis: bool,
	pub language: String,
	pub synthesis_timeout_secs: u64,
	pub tts_endpoint: String,

	/// Worker count; the number of CPUs when unset.
	pub jobs: Option<usize>,
}

fn app_dir() -> PathBuf {
	dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".podcasttool")
}

impl Default for Settings {
	fn default() -> Self {
		let app = app_dir();
		Self {
			catalog: app.join("catalog.json"),
			library_dirs: vec![PathBuf::from("resources/audio")],
			overlay_dir: app.join("audio"),
			archive_dir: app.join("archive"),
			log_file: Some(app.join("log").join("podcast-forge.log")),
			podcast_url: String::new(),
			test_url: String::new(),
			upload_root: None,
			html_mediaplayer: false,
			plugin_url: String::new(),
			format: OutputFormat::Mp3,
			bitrate: DEFAULT_BITRATE.to_string(),
			sample_rate: DEFAULT_SAMPLE_RATE,
			channels: DEFAULT_CHANNELS,
			ffmpeg: PathBuf::from("ffmpeg"),
			synthesis: true,
			language: DEFAULT_LANGUAGE.to_string(),
			synthesis_timeout_secs: DEFAULT_SYNTHESIS_TIMEOUT_SECS,
			tts_endpoint: TTS_ENDPOINT.to_string(),
			jobs: None,
		}
	}
}

impl Settings {
	pub fn default_path() -> PathBuf {
		app_dir().join("config.toml")
	}

	/// Reads `path`. A missing file at the default location yields defaults;
	/// a missing file the user asked for explicitly is an error.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let (path, explicit) = match path {
			Some(p) => (p.to_path_buf(), true),
			None => (Self::default_path(), false),
		};
		if !path.exists() && !explicit {
			return Ok(Self::default());
		}
		let text = std::fs::read_to_string(&path)
			.map_err(|e| PodcastError::Config { path: path.clone(), reason: e.to_string() })?;
		let settings = Self::from_toml(&text)
			.map_err(|reason| PodcastError::Config { path: path.clone(), reason })?;
		settings.validate().map_err(|reason| PodcastError::Config { path, reason })?;
		Ok(settings)
	}

	pub fn from_toml(text: &str) -> std::result::Result<Self, String> {
		toml::from_str(text).map_err(|e| e.to_string())
	}

	pub fn validate(&self) -> std::result::Result<(), String> {
		if self.sample_rate == 0 {
			return Err("sample_rate must be positive".into());
		}
		if self.channels == 0 {
			return Err("channels must be positive".into());
		}
		if self.jobs == Some(0) {
			return Err("jobs must be positive".into());
		}
		Ok(())
	}

	pub fn working_format(&self) -> WorkingFormat {
		WorkingFormat { sample_rate: self.sample_rate, channels: self.channels }
	}

	pub fn synthesis_timeout(&self) -> Duration {
		Duration::from_secs(self.synthesis_timeout_secs)
	}

	/// Shipped roots first, overlay last so it wins on conflicts.
	pub fn library_roots(&self) -> Vec<PathBuf> {
		let mut roots = self.library_dirs.clone();
		roots.push(self.overlay_dir.clone());
		roots
	}

	pub fn worker_count(&self) -> usize {
		self.jobs.unwrap_or_else(num_cpus::get).max(1)
	}
}
