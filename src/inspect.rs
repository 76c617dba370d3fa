// ══════════════════════════════════════════════════════════════════════════════
// INSPECT MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Dry-run views. For a raw recording: what its name decodes to, the intro that
// would be spoken, the assembly plan and which clips the library is missing.
// For a finished podcast: its duration and tags, read with Lofty.

use std::path::{Path, PathBuf};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use crate::assembler::{output_path, AssemblerOptions};
use crate::audio::{format_duration, wav_duration_ms};
use crate::catalog::NameCatalog;
use crate::error::{PodcastError, Result};
use crate::identity::PodcastIdentity;
use crate::intro::IntroScriptBuilder;
use crate::library::AudioLibraryIndex;
use crate::logger::{log, LogLevel};
use crate::naming::ArtifactNamer;
use crate::planner::{AssemblyPlan, SegmentPlanner};

pub struct ClipStatus {
	pub phrase: String,
	pub path: Option<PathBuf>,
}

pub struct RecordingReport {
	pub identity: PodcastIdentity,
	pub course_name: String,
	pub teacher_name: String,
	pub plan: AssemblyPlan,
	pub clips: Vec<ClipStatus>,
	pub output: PathBuf,
	pub link: String,
}

impl RecordingReport {
	pub fn missing(&self) -> impl Iterator<Item = &ClipStatus> {
		self.clips.iter().filter(|c| c.path.is_none())
	}
}

pub fn inspect_recording(
	source: &Path,
	catalog: &NameCatalog,
	library: &AudioLibraryIndex,
	options: &AssemblerOptions,
) -> Result<RecordingReport> {
	let identity = PodcastIdentity::parse(source)?;
	let course_name = catalog.lookup_course(&identity.course_code)?.course_name.clone();
	let teacher_name = catalog.lookup_teacher(&identity.teacher_code)?.to_string();
	let location = ArtifactNamer::new(catalog, &options.base_url, options.format).locate(&identity)?;

	let total_ms = wav_duration_ms(source)?;
	let intro = IntroScriptBuilder::from_catalog(catalog).build(&identity, catalog)?;
	let plan = SegmentPlanner::new(options.cuts, catalog.watermark()).plan(total_ms, &intro)?;

	let mut clips: Vec<ClipStatus> = Vec::new();
	for phrase in plan.phrases() {
		if clips.iter().any(|c| c.phrase == phrase) {
			continue;
		}
		clips.push(ClipStatus { phrase: phrase.to_string(), path: library.resolve(phrase) });
	}

	Ok(RecordingReport {
		output: output_path(source, &location.file_name),
		link: location.link,
		identity,
		course_name,
		teacher_name,
		plan,
		clips,
	})
}

pub fn print_recording(report: &RecordingReport) {
	let id = &report.identity;
	log(LogLevel::Info, &format!("Recording: {}", id.stem()));
	log(LogLevel::Info, &format!("  Course:  {} ({}, edition {})", report.course_name, id.course_code, id.edition));
	log(LogLevel::Info, &format!("  Teacher: {}", report.teacher_name));
	log(LogLevel::Info, &format!("  Date:    {}", id.date.formatted()));
	log(LogLevel::Info, &format!("  Lesson:  {} / {}", id.lesson_label(), id.part_key()));
	log(
		LogLevel::Info,
		&format!(
			"Plan: {} slice(s) of {} from {}",
			report.plan.segment_count,
			format_duration(report.plan.cut_length_ms),
			format_duration(report.plan.total_ms)
		),
	);
	for entry in report.plan.entries() {
		log(LogLevel::Info, &format!("  {}", entry));
	}
	for clip in &report.clips {
		match &clip.path {
			Some(path) => log(LogLevel::Debug, &format!("  clip \"{}\" → {}", clip.phrase, path.display())),
			None => log(LogLevel::Warning, &format!("  clip \"{}\" is missing from the library", clip.phrase)),
		}
	}
	let state = if report.output.exists() { "exists, would be reused" } else { "not built yet" };
	log(LogLevel::Info, &format!("Output: {} ({})", report.output.display(), state));
	log(LogLevel::Info, &format!("Link:   {}", report.link));
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
	pub duration_ms: u64,
	pub album: Option<String>,
	pub artist: Option<String>,
}

pub fn inspect_artifact(path: &Path) -> Result<ArtifactReport> {
	let tagged = Probe::open(path)
		.map_err(|e| PodcastError::tags(path, e))?
		.guess_file_type()
		.map_err(|e| PodcastError::io("Cannot probe", path, e))?
		.read()
		.map_err(|e| PodcastError::tags(path, e))?;

	let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
	Ok(ArtifactReport {
		duration_ms: tagged.properties().duration().as_millis() as u64,
		album: tag.and_then(|t| t.album()).map(|s| s.to_string()),
		artist: tag.and_then(|t| t.artist()).map(|s| s.to_string()),
	})
}

pub fn print_artifact(path: &Path, report: &ArtifactReport) {
	log(LogLevel::Info, &format!("Podcast: {}", path.display()));
	log(LogLevel::Info, &format!("  Duration: {}", format_duration(report.duration_ms)));
	log(LogLevel::Info, &format!("  Course:   {}", report.album.as_deref().unwrap_or("-")));
	log(LogLevel::Info, &format!("  Teacher:  {}", report.artist.as_deref().unwrap_or("-")));
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audio::{write_tags, OutputFormat};
	use crate::config::Settings;
	use crate::planner::CutCount;
	use crate::test_support::{catalog, write_clips, write_tone, RECORDING};

	#[test]
	fn reports_plan_and_missing_clips_without_touching_disk() {
		let dir = tempfile::tempdir().unwrap();
		let source = dir.path().join(RECORDING);
		write_tone(&source, 3_000, 8_000, 1);
		let clips = dir.path().join("clips");
		write_clips(&clips, &["fonderie sonore podcast", "Enrico Cosimi"]);

		let mut settings = Settings::default();
		settings.format = OutputFormat::Wav;
		let options = AssemblerOptions::from_settings(&settings, CutCount::Auto, "https://example.org");
		let report = inspect_recording(&source, &catalog(), &AudioLibraryIndex::scan(&[&clips]), &options).unwrap();

		assert_eq!(report.plan.segment_count, 3);
		assert_eq!(report.teacher_name, "Enrico Cosimi");
		let missing: Vec<&str> = report.missing().map(|c| c.phrase.as_str()).collect();
		assert_eq!(missing, ["Sound Engineering", "fonderie sonore"]);
		assert!(!report.output.exists());
		assert!(!dir.path().join("mp3").exists());
	}

	#[test]
	fn artifact_tags_are_read_back() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("Lezione_8_parte_1.wav");
		write_tone(&path, 1_000, 8_000, 1);
		write_tags(&path, "Sound Engineering", "Enrico Cosimi").unwrap();

		let report = inspect_artifact(&path).unwrap();
		assert!((990..=1_010).contains(&report.duration_ms));
		assert_eq!(report.album.as_deref(), Some("Sound Engineering"));
		assert_eq!(report.artist.as_deref(), Some("Enrico Cosimi"));
	}
}
