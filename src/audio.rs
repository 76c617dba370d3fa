// ══════════════════════════════════════════════════════════════════════════════
// AUDIO MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Audio plumbing for the assembler. Decoding goes through rodio, which sniffs
// the container (WAV, MP3) from the content. Everything is converted to one
// working format (sample rate + channels) and written as 16-bit PCM WAV with
// hound. Lofty probes durations of finished files and writes their tags. MP3
// output is encoded by an external ffmpeg process.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};
use rodio::source::UniformSourceIterator;
use rodio::{ChannelCount, Decoder, SampleRate, Source};
use serde::{Deserialize, Serialize};
use crate::constants::{DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::error::{PodcastError, Result};
use crate::io::open_file;
use crate::logger::{log, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	#[default]
	Mp3,
	Wav,
}

impl OutputFormat {
	pub fn extension(&self) -> &'static str {
		match self {
			OutputFormat::Mp3 => "mp3",
			OutputFormat::Wav => "wav",
		}
	}
}

/// Sample rate and channel layout every staged file is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingFormat {
	pub sample_rate: u32,
	pub channels: u16,
}

impl Default for WorkingFormat {
	fn default() -> Self {
		Self { sample_rate: DEFAULT_SAMPLE_RATE, channels: DEFAULT_CHANNELS }
	}
}

impl WorkingFormat {
	fn spec(&self) -> WavSpec {
		WavSpec {
			channels: self.channels,
			sample_rate: self.sample_rate,
			bits_per_sample: 16,
			sample_format: SampleFormat::Int,
		}
	}

	pub fn frames_to_ms(&self, frames: u64) -> u64 {
		frames * 1000 / self.sample_rate as u64
	}
}

/// Formats milliseconds as "Hh MMm SSs", the duration shown on the landing page.
pub fn format_duration(ms: u64) -> String {
	let secs = ms / 1000;
	format!("{}h {:02}m {:02}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Length of a raw WAV recording in milliseconds, rounded up so the last
/// slice never ends up shorter than a millisecond.
pub fn wav_duration_ms(path: &Path) -> Result<u64> {
	let reader = WavReader::open(path).map_err(|e| PodcastError::InvalidSource {
		path: path.to_path_buf(),
		reason: e.to_string(),
	})?;
	let rate = reader.spec().sample_rate as u64;
	if rate == 0 {
		return Err(PodcastError::InvalidSource { path: path.to_path_buf(), reason: "sample rate is zero".into() });
	}
	let frames = reader.duration() as u64;
	Ok((frames * 1000).div_ceil(rate))
}

/// Duration of any finished audio file, read from its headers without decoding.
pub fn probe_duration_ms(path: &Path) -> Result<u64> {
	let tagged = Probe::open(path)
		.map_err(|e| PodcastError::tags(path, e))?
		.guess_file_type()
		.map_err(|e| PodcastError::io("Cannot probe", path, e))?
		.read()
		.map_err(|e| PodcastError::tags(path, e))?;
	Ok(tagged.properties().duration().as_millis() as u64)
}

/// Writes album (course) and artist (teacher) tags into a finished file.
pub fn write_tags(path: &Path, album: &str, artist: &str) -> Result<()> {
	let tagged = Probe::open(path)
		.map_err(|e| PodcastError::tags(path, e))?
		.guess_file_type()
		.map_err(|e| PodcastError::io("Cannot probe", path, e))?
		.read()
		.map_err(|e| PodcastError::tags(path, e))?;
	let mut tag = Tag::new(tagged.primary_tag_type());
	tag.set_album(album.to_string());
	tag.set_artist(artist.to_string());
	tag.save_to_path(path, WriteOptions::default())
		.map_err(|e| PodcastError::tags(path, e))
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
	let file = open_file(path)?;
	Decoder::new(BufReader::new(file)).map_err(|e| PodcastError::decode(path, e))
}

fn to_pcm16(sample: f32) -> i16 {
	(sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Streaming WAV writer in the working format that counts what it receives.
pub struct WavSink {
	writer: WavWriter<BufWriter<File>>,
	path: PathBuf,
	format: WorkingFormat,
	samples: u64,
}

impl WavSink {
	pub fn create(path: &Path, format: WorkingFormat) -> Result<Self> {
		let writer = WavWriter::create(path, format.spec()).map_err(|e| PodcastError::wav(path, e))?;
		Ok(Self { writer, path: path.to_path_buf(), format, samples: 0 })
	}

	/// Converts `source` to the working format and appends it.
	pub fn append_source<S: Source>(&mut self, source: S, origin: &Path) -> Result<()> {
		let channels: ChannelCount = self
			.format
			.channels
			.try_into()
			.map_err(|_| PodcastError::decode(origin, "channel count must be positive"))?;
		let rate: SampleRate = self
			.format
			.sample_rate
			.try_into()
			.map_err(|_| PodcastError::decode(origin, "sample rate must be positive"))?;

		for sample in UniformSourceIterator::new(source, channels, rate) {
			self.writer
				.write_sample(to_pcm16(sample))
				.map_err(|e| PodcastError::wav(&self.path, e))?;
			self.samples += 1;
		}
		Ok(())
	}

	/// Decodes an audio file of any supported container and appends it.
	pub fn append_file(&mut self, path: &Path) -> Result<()> {
		let decoder = open_decoder(path)?;
		self.append_source(decoder, path)
	}

	pub fn duration_ms(&self) -> u64 {
		self.format.frames_to_ms(self.samples / self.format.channels.max(1) as u64)
	}

	/// Flushes the header and returns the written duration in milliseconds.
	pub fn finalize(self) -> Result<u64> {
		let duration = self.duration_ms();
		self.writer.finalize().map_err(|e| PodcastError::wav(&self.path, e))?;
		Ok(duration)
	}
}

/// Exports `[start_ms, end_ms)` of `source` as a working-format WAV file.
pub fn export_slice(source: &Path, start_ms: u64, end_ms: u64, dest: &Path, format: WorkingFormat) -> Result<u64> {
	let decoder = open_decoder(source)?;
	let slice = decoder
		.skip_duration(Duration::from_millis(start_ms))
		.take_duration(Duration::from_millis(end_ms.saturating_sub(start_ms)));

	let mut sink = WavSink::create(dest, format)?;
	sink.append_source(slice, source)?;
	sink.finalize()
}

/// MP3 encoding settings handed to ffmpeg.
#[derive(Debug, Clone)]
pub struct Mp3Encoder {
	pub program: PathBuf,
	pub bitrate: String,
	pub sample_rate: u32,
}

impl Mp3Encoder {
	pub fn encode(&self, wav: &Path, dest: &Path, album: &str, artist: &str) -> Result<()> {
		let output = Command::new(&self.program)
			.arg("-y")
			.args(["-loglevel", "error"])
			.arg("-i")
			.arg(wav)
			.args(["-codec:a", "libmp3lame"])
			.args(["-b:a", &self.bitrate])
			.args(["-ar", &self.sample_rate.to_string()])
			.arg("-metadata")
			.arg(format!("album={}", album))
			.arg("-metadata")
			.arg(format!("artist={}", artist))
			.arg(dest)
			.output()
			.map_err(|e| PodcastError::Encode {
				path: dest.to_path_buf(),
				reason: format!("cannot run {}: {}. Is ffmpeg installed?", self.program.display(), e),
			})?;

		if !output.status.success() {
			return Err(PodcastError::Encode {
				path: dest.to_path_buf(),
				reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
			});
		}
		log(LogLevel::Debug, &format!("MP3 export with tags completed: {}", dest.display()));
		Ok(())
	}
}
