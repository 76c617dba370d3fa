// ══════════════════════════════════════════════════════════════════════════════
// SYNTH MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Speech synthesis for clips the library lacks. The default voice is Google
// Translate's text-to-speech endpoint, which needs network access; every call
// carries a timeout so an unreachable service cannot stall a worker. Clips are
// written atomically into the overlay directory. Two workers synthesizing the
// same phrase both write it and the last rename wins.

use std::path::{Path, PathBuf};
use std::time::Duration;
use reqwest::blocking::Client;
use crate::constants::TTS_ENDPOINT;
use crate::error::{PodcastError, Result};
use crate::io::{ensure_dir, write_atomic};
use crate::library::normalize;
use crate::logger::{log, LogLevel};

pub trait SpeechSynthesizer: Send + Sync {
	/// Voices `text` into `dest`. `dest` must not be partially written on error.
	fn synthesize(&self, text: &str, dest: &Path) -> Result<()>;
}

pub struct GoogleTts {
	client: Client,
	language: String,
	endpoint: String,
}

impl GoogleTts {
	pub fn new(language: &str, timeout: Duration) -> Result<Self> {
		let client = Client::builder()
			.timeout(timeout)
			.connect_timeout(timeout)
			.build()
			.map_err(|e| PodcastError::Synthesis { text: String::new(), reason: e.to_string() })?;
		Ok(Self { client, language: language.to_string(), endpoint: TTS_ENDPOINT.to_string() })
	}

	pub fn with_endpoint(mut self, endpoint: &str) -> Self {
		self.endpoint = endpoint.to_string();
		self
	}
}

impl SpeechSynthesizer for GoogleTts {
	fn synthesize(&self, text: &str, dest: &Path) -> Result<()> {
		let failed = |reason: String| PodcastError::Synthesis { text: text.to_string(), reason };

		let response = self
			.client
			.get(&self.endpoint)
			.query(&[("ie", "UTF-8"), ("q", text), ("tl", self.language.as_str()), ("client", "tw-ob")])
			.send()
			.map_err(|e| failed(e.to_string()))?
			.error_for_status()
			.map_err(|e| failed(e.to_string()))?;

		let bytes = response.bytes().map_err(|e| failed(e.to_string()))?;
		if bytes.is_empty() {
			return Err(failed("empty response".into()));
		}
		write_atomic(dest, &bytes)
	}
}

/// Synthesizer used when synthesis is switched off: every request fails, so
/// missing clips are only reported.
pub struct NoSynthesis;

impl SpeechSynthesizer for NoSynthesis {
	fn synthesize(&self, text: &str, _dest: &Path) -> Result<()> {
		Err(PodcastError::Synthesis { text: text.to_string(), reason: "speech synthesis disabled".into() })
	}
}

/// Voices library file name `file_name` into `overlay`, returning the new clip.
pub fn synthesize_clip(synth: &dyn SpeechSynthesizer, file_name: &str, overlay: &Path) -> Result<PathBuf> {
	ensure_dir(overlay)?;
	let text = crate::library::spoken_text(file_name);
	let dest = overlay.join(file_name.to_lowercase());
	log(LogLevel::Info, &format!("Synthesizing missing clip \"{}\"", text));
	synth.synthesize(&text, &dest)?;
	Ok(dest)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LibraryReport {
	pub created: Vec<String>,
	pub skipped: Vec<String>,
	pub failed: Vec<String>,
}

/// Voices every phrase into the overlay. Existing clips are left alone unless
/// `overwrite` is set.
pub fn build_library<'a, I>(synth: &dyn SpeechSynthesizer, phrases: I, overlay: &Path, overwrite: bool) -> Result<LibraryReport>
where
	I: IntoIterator<Item = &'a str>,
{
	ensure_dir(overlay)?;
	let mut report = LibraryReport::default();
	for phrase in phrases {
		let file_name = normalize(phrase);
		let dest = overlay.join(&file_name);
		if dest.exists() && !overwrite {
			report.skipped.push(file_name);
			continue;
		}
		match synth.synthesize(phrase, &dest) {
			Ok(()) => {
				log(LogLevel::Success, &format!("Created {}", dest.display()));
				report.created.push(file_name);
			}
			Err(e) => {
				log(LogLevel::Warning, &e.to_string());
				report.failed.push(file_name);
			}
		}
	}
	Ok(report)
}
