// ══════════════════════════════════════════════════════════════════════════════
// ASSEMBLER MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Turns one raw lesson recording into a finished podcast file:
//
//   Planned → Staging → Merging → Finalized
//
// 1. If the artifact already exists its duration is probed and nothing else runs.
// 2. Every plan entry is staged into a scratch directory next to the recording
//    under a zero-padded position prefix.
// 3. Clips the library lacks are synthesized into the overlay directory and the
//    staging pass runs once more. Clips that still cannot be found are left out
//    and reported; the podcast is built without them.
// 4. The staged files are decoded in plan order, converted to the working format
//    and merged, then exported (WAV + tags, or MP3 through ffmpeg) to a
//    temporary sibling of the output path and renamed into place.
// 5. The scratch directory is removed only after a successful export.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::audio::{
	export_slice, format_duration, probe_duration_ms, wav_duration_ms, write_tags, Mp3Encoder, OutputFormat,
	WavSink, WorkingFormat,
};
use crate::catalog::NameCatalog;
use crate::config::Settings;
use crate::constants::{OUTPUT_DIR_NAME, SCRATCH_PREFIX};
use crate::error::{PodcastError, Result};
use crate::identity::PodcastIdentity;
use crate::intro::IntroScriptBuilder;
use crate::io::{clear_files, copy_file, ensure_dir, remove_dir_all, rename, temp_sibling};
use crate::library::{normalize, AudioLibraryIndex};
use crate::logger::{log, LogLevel};
use crate::naming::ArtifactNamer;
use crate::planner::{AssemblyPlan, CutCount, PlanItem, SegmentPlanner};
use crate::record::{HeaderFields, PartFields, PublicationRecord};
use crate::synth::{synthesize_clip, SpeechSynthesizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyState {
	Planned,
	Staging,
	Merging,
	Finalized,
}

impl AssemblyState {
	pub fn label(&self) -> &'static str {
		match self {
			AssemblyState::Planned => "planning",
			AssemblyState::Staging => "staging",
			AssemblyState::Merging => "merging",
			AssemblyState::Finalized => "cleaning up",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Built,
	/// The artifact was already on disk; nothing was staged.
	Reused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyReport {
	pub outcome: Outcome,
	pub output_path: PathBuf,
	pub duration_ms: u64,
	/// Library file names left out of the podcast.
	pub missing: Vec<String>,
	pub stage_passes: usize,
}

/// Clip names missing from any podcast of the run, shared between workers.
#[derive(Debug, Clone, Default)]
pub struct MissingAudio(Arc<Mutex<BTreeSet<String>>>);

impl MissingAudio {
	/// Poisoning is ignored: the set is valid after every insert.
	fn set(&self) -> MutexGuard<'_, BTreeSet<String>> {
		self.0.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn extend<I: IntoIterator<Item = String>>(&self, names: I) {
		self.set().extend(names);
	}

	pub fn snapshot(&self) -> Vec<String> {
		self.set().iter().cloned().collect()
	}

	pub fn is_empty(&self) -> bool {
		self.set().is_empty()
	}
}

/// Per-run knobs, fixed before the first job starts.
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
	pub format: OutputFormat,
	pub working: WorkingFormat,
	pub encoder: Mp3Encoder,
	pub cuts: CutCount,
	/// Root URL artifacts are published under.
	pub base_url: String,
	/// Where synthesized clips are written.
	pub overlay_dir: PathBuf,
}

impl AssemblerOptions {
	pub fn from_settings(settings: &Settings, cuts: CutCount, base_url: &str) -> Self {
		Self {
			format: settings.format,
			working: settings.working_format(),
			encoder: Mp3Encoder {
				program: settings.ffmpeg.clone(),
				bitrate: settings.bitrate.clone(),
				sample_rate: settings.sample_rate,
			},
			cuts,
			base_url: base_url.to_string(),
			overlay_dir: settings.overlay_dir.clone(),
		}
	}
}

/// Output artifact path for `source`: `<recording dir>/mp3/<name>`.
pub fn output_path(source: &Path, file_name: &str) -> PathBuf {
	recording_dir(source).join(OUTPUT_DIR_NAME).join(file_name)
}

fn recording_dir(source: &Path) -> PathBuf {
	match source.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
		_ => PathBuf::from("."),
	}
}

pub fn scratch_dir(source: &Path, identity: &PodcastIdentity) -> PathBuf {
	recording_dir(source).join(format!("{}{}", SCRATCH_PREFIX, identity.stem()))
}

/// Staged files of `plan` that exist in `scratch`, in plan order.
fn staged_files(plan: &AssemblyPlan, scratch: &Path) -> Vec<PathBuf> {
	plan.entries()
		.iter()
		.map(|entry| scratch.join(entry.staged_name()))
		.filter(|path| path.is_file())
		.collect()
}

fn aborted(identity: &PodcastIdentity, state: AssemblyState, source: PodcastError) -> PodcastError {
	PodcastError::Aborted { name: identity.stem().to_string(), state: state.label(), source: Box::new(source) }
}

pub struct AudioAssembler<'a> {
	catalog: &'a NameCatalog,
	synth: &'a dyn SpeechSynthesizer,
	options: &'a AssemblerOptions,
	missing: MissingAudio,
}

impl<'a> AudioAssembler<'a> {
	pub fn new(catalog: &'a NameCatalog, synth: &'a dyn SpeechSynthesizer, options: &'a AssemblerOptions, missing: MissingAudio) -> Self {
		Self { catalog, synth, options, missing }
	}

	/// Assembles `source` and fills `record` with its header and part entry.
	pub fn assemble(&self, source: &Path, index: &mut AudioLibraryIndex, record: &mut PublicationRecord) -> Result<AssemblyReport> {
		let identity = PodcastIdentity::parse(source)?;
		let course = self.catalog.lookup_course(&identity.course_code)?;
		let teacher = self.catalog.lookup_teacher(&identity.teacher_code)?;
		let location = ArtifactNamer::new(self.catalog, &self.options.base_url, self.options.format).locate(&identity)?;
		let output = output_path(source, &location.file_name);

		record.add_header(HeaderFields {
			archive_name: identity.archive_name(),
			registration_date: identity.date.formatted(),
			course_name: course.course_name.clone(),
			teacher_name: teacher.to_string(),
			lesson: identity.lesson_label(),
		});
		let mut part = PartFields {
			duration: None,
			path: Some(output.display().to_string()),
			server_path: Some(location.server_path.clone()),
			link: Some(location.link.clone()),
		};

		if output.exists() {
			let duration_ms = probe_duration_ms(&output)?;
			log(LogLevel::Info, &format!("Podcast already exists, skipping: {}", output.display()));
			part.duration = Some(format_duration(duration_ms));
			record.add_part(&identity.part_key(), part);
			return Ok(AssemblyReport {
				outcome: Outcome::Reused,
				output_path: output,
				duration_ms,
				missing: Vec::new(),
				stage_passes: 0,
			});
		}

		let total_ms = wav_duration_ms(source)?;
		let intro = IntroScriptBuilder::from_catalog(self.catalog).build(&identity, self.catalog)?;
		let plan = SegmentPlanner::new(self.options.cuts, self.catalog.watermark()).plan(total_ms, &intro)?;
		log(
			LogLevel::Info,
			&format!(
				"{}: {} cut(s) of {} each, {} plan entries",
				identity.stem(),
				plan.segment_count,
				format_duration(plan.cut_length_ms),
				plan.len()
			),
		);

		let scratch = scratch_dir(source, &identity);
		ensure_dir(&scratch).map_err(|e| aborted(&identity, AssemblyState::Staging, e))?;

		let mut missing = self
			.stage(&plan, source, &scratch, index)
			.map_err(|e| aborted(&identity, AssemblyState::Staging, e))?;
		let mut stage_passes = 1;

		if !missing.is_empty() {
			let before = missing.len();
			self.recover(&mut missing, index);
			if missing.len() < before {
				missing = self
					.stage(&plan, source, &scratch, index)
					.map_err(|e| aborted(&identity, AssemblyState::Staging, e))?;
				stage_passes += 1;
			}
		}
		for name in &missing {
			log(LogLevel::Warning, &format!("Missing audio clip, left out of {}: {}", identity.stem(), name));
		}

		let duration_ms = self
			.merge(&plan, &scratch, &output, &course.course_name, teacher)
			.map_err(|e| aborted(&identity, AssemblyState::Merging, e))?;

		if let Err(e) = remove_dir_all(&scratch) {
			log(LogLevel::Warning, &aborted(&identity, AssemblyState::Finalized, e).to_string());
		}

		part.duration = Some(format_duration(duration_ms));
		record.add_part(&identity.part_key(), part);
		log(LogLevel::Success, &format!("Podcast created: {} ({})", output.display(), format_duration(duration_ms)));

		let missing: Vec<String> = missing.into_iter().collect();
		self.missing.extend(missing.iter().cloned());
		Ok(AssemblyReport { outcome: Outcome::Built, output_path: output, duration_ms, missing, stage_passes })
	}

	/// One staging pass. Leftovers from earlier passes or crashed runs go
	/// first. Returns the clip file names the library could not provide.
	fn stage(&self, plan: &AssemblyPlan, source: &Path, scratch: &Path, index: &AudioLibraryIndex) -> Result<BTreeSet<String>> {
		let purged = clear_files(scratch)?;
		if purged > 0 {
			log(LogLevel::Debug, &format!("Purged {} stale file(s) from {}", purged, scratch.display()));
		}

		let mut missing = BTreeSet::new();
		for entry in plan.entries() {
			let dest = scratch.join(entry.staged_name());
			match &entry.item {
				PlanItem::Slice { start_ms, end_ms, .. } => {
					export_slice(source, *start_ms, *end_ms, &dest, self.options.working)?;
				}
				PlanItem::Clip { phrase } => match index.resolve(phrase) {
					Some(clip) => {
						copy_file(&clip, &dest)?;
					}
					None => {
						missing.insert(normalize(phrase));
					}
				},
			}
			log(LogLevel::Debug, &format!("Staged {}", entry));
		}
		Ok(missing)
	}

	/// Synthesizes what it can of `missing`; recovered names leave the set.
	fn recover(&self, missing: &mut BTreeSet<String>, index: &mut AudioLibraryIndex) {
		let wanted: Vec<String> = missing.iter().cloned().collect();
		for file_name in wanted {
			match synthesize_clip(self.synth, &file_name, &self.options.overlay_dir) {
				Ok(_) => {
					index.register(&file_name, &self.options.overlay_dir);
					missing.remove(&file_name);
				}
				Err(e) => log(LogLevel::Warning, &format!("Cannot synthesize {}: {}", file_name, e)),
			}
		}
	}

	/// Concatenates the staged files in plan order and exports the artifact.
	/// Clips that never got staged are skipped. Returns the duration.
	fn merge(&self, plan: &AssemblyPlan, scratch: &Path, output: &Path, album: &str, artist: &str) -> Result<u64> {
		if let Some(dir) = output.parent() {
			ensure_dir(dir)?;
		}
		let staged = staged_files(plan, scratch);
		let wav = temp_sibling(&output.with_extension(OutputFormat::Wav.extension()));

		let result = self.export(&staged, &wav, output, album, artist);
		if wav.exists() {
			let _ = std::fs::remove_file(&wav);
		}
		result
	}

	fn export(&self, staged: &[PathBuf], wav: &Path, output: &Path, album: &str, artist: &str) -> Result<u64> {
		let mut sink = WavSink::create(wav, self.options.working)?;
		for file in staged {
			sink.append_file(file)?;
		}
		let duration_ms = sink.finalize()?;

		match self.options.format {
			OutputFormat::Wav => {
				write_tags(wav, album, artist)?;
				rename(wav, output)?;
			}
			OutputFormat::Mp3 => {
				let mp3 = temp_sibling(output);
				if let Err(e) = self.options.encoder.encode(wav, &mp3, album, artist) {
					let _ = std::fs::remove_file(&mp3);
					return Err(e);
				}
				rename(&mp3, output)?;
			}
		}
		Ok(duration_ms)
	}
}
