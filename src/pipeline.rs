// ══════════════════════════════════════════════════════════════════════════════
// PIPELINE MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Runs a batch of recordings through the assembler on a bounded worker pool and
// publishes each lesson once every one of its parts has been assembled.
//
// All names are validated before the first worker starts, so a typo in one file
// name stops the whole batch instead of surfacing halfway through. After that,
// a failing job only takes itself down; the summary lists it.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::thread;
use glob::{MatchOptions, Pattern};
use crate::assembler::{AssemblerOptions, AssemblyReport, AudioAssembler, MissingAudio, Outcome};
use crate::catalog::NameCatalog;
use crate::error::{PodcastError, Result};
use crate::identity::PodcastIdentity;
use crate::library::AudioLibraryIndex;
use crate::logger::{log, LogLevel};
use crate::publish::{remote_dir, render_page, write_archive, PageOptions, Uploader};
use crate::record::PublicationRecord;
use crate::synth::SpeechSynthesizer;

/// `.wav` recordings named by `input`: the file itself, or the visible `.wav`
/// files directly inside a directory, sorted by name.
pub fn collect_recordings(input: &Path) -> Result<Vec<PathBuf>> {
	if input.is_file() {
		return Ok(vec![input.to_path_buf()]);
	}
	if !input.is_dir() {
		return Err(PodcastError::io(
			"Cannot find recordings",
			input,
			std::io::Error::from(std::io::ErrorKind::NotFound),
		));
	}

	let pattern = format!("{}/*.wav", Pattern::escape(&input.to_string_lossy()));
	let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };
	let paths = glob::glob_with(&pattern, options).map_err(|e| PodcastError::InvalidSource {
		path: input.to_path_buf(),
		reason: e.to_string(),
	})?;

	let mut recordings: Vec<PathBuf> = paths
		.flatten()
		.filter(|p| p.is_file())
		.filter(|p| !p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.')))
		.collect();
	recordings.sort();
	Ok(recordings)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
	pub source: PathBuf,
	pub error: String,
	/// The recording itself is unusable; running again will not help.
	pub input_error: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonOutcome {
	pub archive_name: String,
	pub parts: usize,
	pub uploaded: usize,
	pub page: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
	pub reports: Vec<AssemblyReport>,
	pub failures: Vec<JobFailure>,
	pub lessons: Vec<LessonOutcome>,
	/// Clip names left out of at least one podcast.
	pub missing: Vec<String>,
}

impl RunSummary {
	pub fn succeeded(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn built(&self) -> usize {
		self.reports.iter().filter(|r| r.outcome == Outcome::Built).count()
	}

	pub fn reused(&self) -> usize {
		self.reports.iter().filter(|r| r.outcome == Outcome::Reused).count()
	}
}

type JobResult = std::result::Result<(AssemblyReport, PublicationRecord), (String, bool)>;

/// Parts of one lesson, collected until the last one reports back.
#[derive(Default)]
struct LessonProgress {
	pending: usize,
	record: PublicationRecord,
	outputs: Vec<PathBuf>,
}

pub struct Pipeline<'a> {
	catalog: &'a NameCatalog,
	synth: &'a dyn SpeechSynthesizer,
	options: AssemblerOptions,
	library: AudioLibraryIndex,
	uploader: Option<&'a dyn Uploader>,
	archive_dir: Option<PathBuf>,
	page: PageOptions,
	workers: usize,
}

impl<'a> Pipeline<'a> {
	pub fn new(catalog: &'a NameCatalog, synth: &'a dyn SpeechSynthesizer, options: AssemblerOptions, library: AudioLibraryIndex) -> Self {
		Self {
			catalog,
			synth,
			options,
			library,
			uploader: None,
			archive_dir: None,
			page: PageOptions::default(),
			workers: 1,
		}
	}

	pub fn uploader(mut self, uploader: &'a dyn Uploader) -> Self {
		self.uploader = Some(uploader);
		self
	}

	pub fn archive(mut self, dir: impl Into<PathBuf>, page: PageOptions) -> Self {
		self.archive_dir = Some(dir.into());
		self.page = page;
		self
	}

	pub fn workers(mut self, workers: usize) -> Self {
		self.workers = workers.max(1);
		self
	}

	/// Checks every name and catalog code up front; any failure aborts the run.
	fn validate(&self, recordings: &[PathBuf]) -> Result<Vec<PodcastIdentity>> {
		recordings
			.iter()
			.map(|path| {
				let identity = PodcastIdentity::parse(path)?;
				self.catalog.lookup_course(&identity.course_code)?;
				self.catalog.lookup_teacher(&identity.teacher_code)?;
				Ok(identity)
			})
			.collect()
	}

	pub fn run(&self, recordings: &[PathBuf]) -> Result<RunSummary> {
		let identities = self.validate(recordings)?;
		let mut summary = RunSummary::default();
		if recordings.is_empty() {
			log(LogLevel::Warning, "No recordings to assemble");
			return Ok(summary);
		}

		let mut lessons: BTreeMap<String, LessonProgress> = BTreeMap::new();
		for identity in &identities {
			lessons.entry(identity.archive_name()).or_default().pending += 1;
		}
		let lesson_of: HashMap<usize, String> =
			identities.iter().enumerate().map(|(i, id)| (i, id.archive_name())).collect();

		let missing = MissingAudio::default();
		let assembler = AudioAssembler::new(self.catalog, self.synth, &self.options, missing.clone());
		let workers = self.workers.min(recordings.len());
		log(LogLevel::Info, &format!("Assembling {} recording(s) on {} worker(s)", recordings.len(), workers));

		let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, &Path)>();
		let (done_tx, done_rx) = crossbeam_channel::unbounded::<(usize, JobResult)>();
		for (i, path) in recordings.iter().enumerate() {
			// The receiver lives until the end of this function.
			let _ = job_tx.send((i, path.as_path()));
		}
		drop(job_tx);

		thread::scope(|scope| {
			for _ in 0..workers {
				let job_rx = job_rx.clone();
				let done_tx = done_tx.clone();
				let assembler = &assembler;
				scope.spawn(move || {
					for (i, path) in job_rx.iter() {
						let mut index = self.library.clone();
						let mut record = PublicationRecord::new();
						let result = assembler
							.assemble(path, &mut index, &mut record)
							.map(|report| (report, record))
							.map_err(|e| (e.to_string(), e.is_fatal_input()));
						if done_tx.send((i, result)).is_err() {
							break;
						}
					}
				});
			}
			drop(done_tx);

			for (i, result) in done_rx.iter() {
				let name = &lesson_of[&i];
				let Some(lesson) = lessons.get_mut(name) else { continue };
				lesson.pending -= 1;
				match result {
					Ok((report, record)) => {
						lesson.record.merge(record);
						lesson.outputs.push(report.output_path.clone());
						summary.reports.push(report);
					}
					Err((error, input_error)) => {
						log(LogLevel::Error, &error);
						summary.failures.push(JobFailure { source: recordings[i].clone(), error, input_error });
					}
				}
				if lesson.pending == 0 {
					let lesson = std::mem::take(lesson);
					summary.lessons.push(self.publish(name, lesson));
				}
			}
		});

		summary.missing = missing.snapshot();
		Ok(summary)
	}

	/// Uploads the assembled parts of one lesson and archives its page.
	/// Failures here are logged and never fail the run.
	fn publish(&self, archive_name: &str, lesson: LessonProgress) -> LessonOutcome {
		let mut outcome = LessonOutcome {
			archive_name: archive_name.to_string(),
			parts: lesson.outputs.len(),
			..Default::default()
		};
		if lesson.outputs.is_empty() {
			log(LogLevel::Warning, &format!("No part of {} was assembled, nothing to publish", archive_name));
			return outcome;
		}

		if let Some(uploader) = self.uploader {
			outcome.uploaded = self.upload(uploader, &lesson);
		}

		if let Some(dir) = &self.archive_dir {
			let page = render_page(&lesson.record, &self.page);
			match write_archive(dir, &lesson.record, &page) {
				Ok(path) => outcome.page = Some(path),
				Err(e) => log(LogLevel::Warning, &format!("Cannot archive landing page: {}", e)),
			}
		}
		outcome
	}

	fn upload(&self, uploader: &dyn Uploader, lesson: &LessonProgress) -> usize {
		let Some(server_path) = lesson.record.parts().find_map(|(_, part)| part.server_path.clone()) else {
			return 0;
		};
		let remote = remote_dir(&server_path);
		if let Err(e) = uploader.ensure_remote_dir(&remote) {
			log(LogLevel::Warning, &format!("Cannot prepare remote folder {}: {}", remote, e));
			return 0;
		}

		let mut uploaded = 0;
		for output in &lesson.outputs {
			match uploader.upload(output, &remote) {
				Ok(()) => uploaded += 1,
				Err(e) => log(LogLevel::Warning, &e.to_string()),
			}
		}
		uploaded
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audio::OutputFormat;
	use crate::config::Settings;
	use crate::planner::CutCount;
	use crate::publish::MirrorUploader;
	use crate::test_support::{catalog, write_clips, write_tone, ToneSynth};
	use std::sync::Mutex;

	struct CountingUploader {
		ensured: Mutex<Vec<String>>,
		uploads: Mutex<Vec<PathBuf>>,
	}

	impl Uploader for CountingUploader {
		fn ensure_remote_dir(&self, remote_dir: &str) -> Result<()> {
			self.ensured.lock().unwrap().push(remote_dir.to_string());
			Ok(())
		}

		fn upload(&self, local: &Path, _remote_dir: &str) -> Result<()> {
			self.uploads.lock().unwrap().push(local.to_path_buf());
			Ok(())
		}
	}

	fn options(overlay: &Path) -> AssemblerOptions {
		let mut settings = Settings::default();
		settings.format = OutputFormat::Wav;
		settings.sample_rate = 8_000;
		settings.overlay_dir = overlay.to_path_buf();
		AssemblerOptions::from_settings(&settings, CutCount::Manual(2), "https://example.org")
	}

	fn library(dir: &Path) -> AudioLibraryIndex {
		write_clips(dir, &["fonderie sonore podcast", "Sound Engineering", "Enrico Cosimi", "fonderie sonore"]);
		AudioLibraryIndex::scan(&[dir])
	}

	#[test]
	fn collects_only_visible_wave_files() {
		let dir = tempfile::tempdir().unwrap();
		for name in ["b.wav", "a.WAV", ".hidden.wav", "notes.txt"] {
			std::fs::write(dir.path().join(name), b"x").unwrap();
		}
		let found: Vec<String> = collect_recordings(dir.path())
			.unwrap()
			.iter()
			.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
			.collect();
		assert_eq!(found, ["a.WAV", "b.wav"]);
		assert!(collect_recordings(&dir.path().join("missing")).is_err());
	}

	#[test]
	fn bad_names_abort_before_any_work() {
		let dir = tempfile::tempdir().unwrap();
		let good = dir.path().join("SEC6_20190228_E_Cosimi_Lezione_8_parte_1.wav");
		let bad = dir.path().join("lesson eight.wav");
		write_tone(&good, 500, 8_000, 1);
		write_tone(&bad, 500, 8_000, 1);

		let catalog = catalog();
		let synth = ToneSynth::new();
		let pipeline = Pipeline::new(&catalog, &synth, options(&dir.path().join("overlay")), AudioLibraryIndex::default());
		let err = pipeline.run(&[good.clone(), bad]).unwrap_err();
		assert!(matches!(err, PodcastError::InvalidFilename { .. }));
		assert!(!good.with_file_name("mp3").exists());
	}

	#[test]
	fn lessons_are_published_once_with_every_part() {
		let root = tempfile::tempdir().unwrap();
		let lessons = root.path().join("lessons");
		std::fs::create_dir_all(&lessons).unwrap();
		for part in 1..=2 {
			write_tone(&lessons.join(format!("SEC6_20190228_E_Cosimi_Lezione_8_parte_{}.wav", part)), 1_000, 8_000, 1);
		}
		write_tone(&lessons.join("SEC6_20190307_E_Cosimi_Lezione_9_parte_1.wav"), 1_000, 8_000, 1);

		let catalog = catalog();
		let synth = ToneSynth::new();
		let uploader = CountingUploader { ensured: Mutex::new(Vec::new()), uploads: Mutex::new(Vec::new()) };
		let archive = root.path().join("archive");
		let pipeline = Pipeline::new(&catalog, &synth, options(&root.path().join("overlay")), library(&root.path().join("clips")))
			.uploader(&uploader)
			.archive(&archive, PageOptions::default())
			.workers(3);

		let recordings = collect_recordings(&lessons).unwrap();
		let summary = pipeline.run(&recordings).unwrap();
		assert!(summary.succeeded());
		assert_eq!(summary.built(), 3);
		assert_eq!(summary.lessons.len(), 2);
		assert_eq!(uploader.uploads.lock().unwrap().len(), 3);
		assert_eq!(uploader.ensured.lock().unwrap().as_slice(), ["example.org/PODCAST/SEC/SEC6", "example.org/PODCAST/SEC/SEC6"]);

		let lesson_8 = summary.lessons.iter().find(|l| l.archive_name.ends_with("Lezione_8")).unwrap();
		assert_eq!(lesson_8.parts, 2);
		let page = std::fs::read_to_string(lesson_8.page.as_ref().unwrap()).unwrap();
		assert!(page.contains("Parte 1 | Durata"));
		assert!(page.contains("Parte 2 | Durata"));
	}

	#[test]
	fn a_broken_recording_only_fails_its_own_job() {
		let root = tempfile::tempdir().unwrap();
		let good = root.path().join("SEC6_20190228_E_Cosimi_Lezione_8_parte_1.wav");
		let broken = root.path().join("SEC6_20190307_E_Cosimi_Lezione_9_parte_1.wav");
		write_tone(&good, 1_000, 8_000, 1);
		std::fs::write(&broken, b"not a riff file").unwrap();

		let catalog = catalog();
		let synth = ToneSynth::new();
		let mirror = root.path().join("server");
		let uploader = MirrorUploader::new(&mirror);
		let pipeline = Pipeline::new(&catalog, &synth, options(&root.path().join("overlay")), library(&root.path().join("clips")))
			.uploader(&uploader)
			.workers(2);

		let summary = pipeline.run(&[good, broken.clone()]).unwrap();
		assert!(!summary.succeeded());
		assert_eq!(summary.failures.len(), 1);
		assert_eq!(summary.failures[0].source, broken);
		assert!(summary.failures[0].input_error);
		assert_eq!(summary.built(), 1);
		let published: Vec<_> = summary.lessons.iter().filter(|l| l.uploaded == 1).collect();
		assert_eq!(published.len(), 1);
		assert!(mirror.join("example.org/PODCAST/SEC/SEC6").is_dir());
	}
}
