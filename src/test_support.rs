// Fixtures shared by the unit tests: generated audio, a small catalog and an
// offline synthesizer.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use hound::{SampleFormat, WavSpec, WavWriter};
use crate::catalog::NameCatalog;
use crate::error::{PodcastError, Result};
use crate::library::normalize;
use crate::synth::SpeechSynthesizer;

pub const RECORDING: &str = "SEC6_20190228_E_Cosimi_Lezione_8_parte_1.wav";

pub const CATALOG: &str = r#"{
	"corsi": {"SEC": {"course_name": "Sound Engineering", "course_path": "PODCAST/SEC"}},
	"docenti": {"E_Cosimi": "Enrico Cosimi"},
	"intro": ["fonderie_sonore_podcast", "$VAR{course_name}", "$VAR{teacher_name}"],
	"watermark": "fonderie sonore"
}"#;

pub fn catalog() -> NameCatalog {
	NameCatalog::from_json(CATALOG).unwrap()
}

/// Writes a 440 Hz sine of `ms` milliseconds as 16-bit PCM.
pub fn write_tone(path: &Path, ms: u64, rate: u32, channels: u16) {
	let spec = WavSpec { channels, sample_rate: rate, bits_per_sample: 16, sample_format: SampleFormat::Int };
	let mut writer = WavWriter::create(path, spec).unwrap();
	let frames = ms * rate as u64 / 1000;
	for frame in 0..frames {
		let t = frame as f32 / rate as f32;
		let sample = ((2.0 * PI * 440.0 * t).sin() * 0.25 * i16::MAX as f32) as i16;
		for _ in 0..channels {
			writer.write_sample(sample).unwrap();
		}
	}
	writer.finalize().unwrap();
}

/// Writes one short clip per phrase into `dir`, named like the library expects.
pub fn write_clips(dir: &Path, phrases: &[&str]) -> Vec<PathBuf> {
	std::fs::create_dir_all(dir).unwrap();
	phrases
		.iter()
		.map(|phrase| {
			let path = dir.join(normalize(phrase));
			write_tone(&path, 200, 8_000, 1);
			path
		})
		.collect()
}

/// Offline synthesizer: voices every phrase as a short tone, except those
/// listed in `refuse`. Remembers what it was asked.
pub struct ToneSynth {
	pub refuse: Vec<String>,
	pub calls: Mutex<Vec<String>>,
}

impl ToneSynth {
	pub fn new() -> Self {
		Self { refuse: Vec::new(), calls: Mutex::new(Vec::new()) }
	}

	pub fn refusing(phrases: &[&str]) -> Self {
		Self { refuse: phrases.iter().map(|p| p.to_string()).collect(), calls: Mutex::new(Vec::new()) }
	}

	pub fn calls(&self) -> Vec<String> {
		self.calls.lock().unwrap().clone()
	}
}

impl SpeechSynthesizer for ToneSynth {
	fn synthesize(&self, text: &str, dest: &Path) -> Result<()> {
		self.calls.lock().unwrap().push(text.to_string());
		if self.refuse.iter().any(|r| r == text) {
			return Err(PodcastError::Synthesis { text: text.to_string(), reason: "offline".into() });
		}
		write_tone(dest, 200, 8_000, 1);
		Ok(())
	}
}
