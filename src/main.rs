// ╔══════════════════════════════════════════════════════════════════════════════╗
// ║                              PODCAST-FORGE                                   ║
// ║                  Lesson Recordings → Published Podcasts                      ║
// ╚══════════════════════════════════════════════════════════════════════════════╝
//
// 🎯 PROJECT GOAL
// ---------------
// Fonderie Sonore records every lesson as one long WAV file. podcast-forge turns
// each of them into a podcast a student can download: a spoken intro naming the
// course, teacher, date and lesson, then the lesson itself cut into slices with
// the school's watermark clip between them.
//
// 📦 HOW IT WORKS
// ---------------
//   SEC6_20190228_E_Cosimi_Lezione_8_parte_1.wav
//     → name decoded (course, edition, date, teacher, lesson, part)
//     → intro phrases + slices + watermarks planned
//     → clips copied from the audio library, slices exported, all merged
//     → mp3/Lezione_8_parte_1_<crc32>.mp3 next to the recording
//     → uploaded, landing page archived once every part of the lesson is done
//
// Clips missing from the library are synthesized on the fly; if that fails the
// podcast is still built without them and the gap is reported.
//
// ══════════════════════════════════════════════════════════════════════════════

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use clap::{Parser, Subcommand};
use colored::*;
use podcast_forge::assembler::AssemblerOptions;
use podcast_forge::audio::OutputFormat;
use podcast_forge::error::Result;
use podcast_forge::identity::PodcastIdentity;
use podcast_forge::inspect::{inspect_artifact, inspect_recording, print_artifact, print_recording};
use podcast_forge::logger::{self, log, LogLevel};
use podcast_forge::pipeline::{collect_recordings, Pipeline};
use podcast_forge::publish::{DryRunUploader, MirrorUploader, PageOptions, Uploader};
use podcast_forge::synth::{build_library, GoogleTts, NoSynthesis, SpeechSynthesizer};
use podcast_forge::{AudioLibraryIndex, CutCount, NameCatalog, Settings};

/// Assemble lesson recordings into podcasts
#[derive(Parser)]
#[command(name = "podcast-forge")]
#[command(version)]
#[command(about = "Assemble Fonderie Sonore lesson recordings into podcasts", long_about = None)]
struct Cli {
	/// Settings file (defaults to ~/.podcasttool/config.toml)
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	/// Show debug output
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Build podcasts from a recording or a directory of recordings
	Build {
		/// A .wav recording or a directory containing them
		input: PathBuf,

		/// Number of slices (automatic from the duration when omitted)
		#[arg(short, long)]
		cuts: Option<usize>,

		/// MP3 bitrate, e.g. 64k
		#[arg(long)]
		bitrate: Option<String>,

		/// Working and output sample rate in Hz
		#[arg(long)]
		sample_rate: Option<u32>,

		/// Output container
		#[arg(long, value_enum)]
		format: Option<OutputFormat>,

		/// Publish links and uploads under the test URL
		#[arg(long)]
		test_env: bool,

		/// Number of recordings assembled in parallel
		#[arg(short, long)]
		jobs: Option<usize>,

		/// Skip the upload step
		#[arg(long)]
		no_upload: bool,

		/// Never synthesize missing clips
		#[arg(long)]
		no_synthesis: bool,
	},

	/// Show what a recording would become, or read back a finished podcast
	Inspect {
		/// A raw recording or an assembled podcast
		path: PathBuf,

		/// Number of slices to plan with
		#[arg(short, long)]
		cuts: Option<usize>,
	},

	/// List the clips in the audio library
	Library {
		/// Only report catalog names that have no clip
		#[arg(long)]
		missing: bool,
	},

	/// Synthesize clips into the overlay library
	Synth {
		/// Phrases to voice
		phrases: Vec<String>,

		/// Voice every course and teacher name in the catalog
		#[arg(long)]
		catalog_names: bool,

		/// Replace clips that already exist
		#[arg(long)]
		overwrite: bool,
	},
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let mut settings = match Settings::load(cli.config.as_deref()) {
		Ok(settings) => settings,
		Err(e) => {
			log(LogLevel::Error, &e.to_string());
			return ExitCode::FAILURE;
		}
	};
	if let Err(e) = logger::init(cli.verbose, settings.log_file.as_deref()) {
		log(LogLevel::Warning, &format!("Cannot open log file: {}", e));
	}
	log(LogLevel::Debug, &format!("Welcome to {}!", "podcast-forge".cyan()));

	let result = match cli.command {
		Commands::Build { input, cuts, bitrate, sample_rate, format, test_env, jobs, no_upload, no_synthesis } => {
			if let Some(bitrate) = bitrate {
				settings.bitrate = bitrate;
			}
			if let Some(rate) = sample_rate {
				settings.sample_rate = rate;
			}
			if let Some(format) = format {
				settings.format = format;
			}
			if jobs.is_some() {
				settings.jobs = jobs;
			}
			if no_synthesis {
				settings.synthesis = false;
			}
			settings
				.validate()
				.map_err(|reason| podcast_forge::PodcastError::Config { path: PathBuf::from("<command line>"), reason })
				.and_then(|()| build(&settings, &input, CutCount::from(cuts), test_env, !no_upload))
		}
		Commands::Inspect { path, cuts } => inspect(&settings, &path, CutCount::from(cuts)),
		Commands::Library { missing } => library(&settings, missing),
		Commands::Synth { phrases, catalog_names, overwrite } => synth(&settings, phrases, catalog_names, overwrite),
	};

	match result {
		Ok(true) => ExitCode::SUCCESS,
		Ok(false) => ExitCode::FAILURE,
		Err(e) => {
			log(LogLevel::Error, &e.to_string());
			ExitCode::FAILURE
		}
	}
}

fn base_url(settings: &Settings, test_env: bool) -> &str {
	if test_env { &settings.test_url } else { &settings.podcast_url }
}

fn synthesizer(settings: &Settings) -> Result<Box<dyn SpeechSynthesizer>> {
	if !settings.synthesis {
		return Ok(Box::new(NoSynthesis));
	}
	let tts = GoogleTts::new(&settings.language, settings.synthesis_timeout())?.with_endpoint(&settings.tts_endpoint);
	Ok(Box::new(tts))
}

fn build(settings: &Settings, input: &Path, cuts: CutCount, test_env: bool, upload: bool) -> Result<bool> {
	let catalog = NameCatalog::load(&settings.catalog)?;
	let recordings = collect_recordings(input)?;
	let library = AudioLibraryIndex::scan(&settings.library_roots());
	let synth = synthesizer(settings)?;
	let options = AssemblerOptions::from_settings(settings, cuts, base_url(settings, test_env));

	let uploader: Box<dyn Uploader> = match &settings.upload_root {
		Some(root) => Box::new(MirrorUploader::new(root)),
		None => Box::new(DryRunUploader),
	};
	let page = PageOptions { media_player: settings.html_mediaplayer, plugin_url: settings.plugin_url.clone() };

	let mut pipeline = Pipeline::new(&catalog, synth.as_ref(), options, library)
		.archive(&settings.archive_dir, page)
		.workers(settings.worker_count());
	if upload {
		pipeline = pipeline.uploader(uploader.as_ref());
	}

	let summary = pipeline.run(&recordings)?;

	log(
		LogLevel::Info,
		&format!(
			"{} built, {} reused, {} failed",
			summary.built(),
			summary.reused(),
			summary.failures.len()
		),
	);
	for failure in &summary.failures {
		let hint = if failure.input_error { "fix the recording" } else { "a re-run may succeed" };
		log(LogLevel::Error, &format!("{}: {} ({})", failure.source.display(), failure.error, hint));
	}
	if !summary.missing.is_empty() {
		log(LogLevel::Warning, &format!("Missing audio clips: {}", summary.missing.join(", ")));
	}
	Ok(summary.succeeded())
}

fn inspect(settings: &Settings, path: &Path, cuts: CutCount) -> Result<bool> {
	if PodcastIdentity::parse(path).is_err() {
		let report = inspect_artifact(path)?;
		print_artifact(path, &report);
		return Ok(true);
	}

	let catalog = NameCatalog::load(&settings.catalog)?;
	let library = AudioLibraryIndex::scan(&settings.library_roots());
	let options = AssemblerOptions::from_settings(settings, cuts, &settings.podcast_url);
	let report = inspect_recording(path, &catalog, &library, &options)?;
	print_recording(&report);
	Ok(true)
}

fn library(settings: &Settings, missing_only: bool) -> Result<bool> {
	let library = AudioLibraryIndex::scan(&settings.library_roots());

	if !missing_only {
		let mut names: Vec<&str> = library.file_names().collect();
		names.sort_unstable();
		for name in &names {
			log(LogLevel::Info, name);
		}
		log(LogLevel::Success, &format!("{} clip(s) in the library", names.len()));
		return Ok(true);
	}

	let catalog = NameCatalog::load(&settings.catalog)?;
	let mut missing: Vec<&str> = catalog
		.course_names()
		.chain(catalog.teacher_names())
		.chain(std::iter::once(catalog.watermark()))
		.filter(|name| !name.is_empty() && library.resolve(name).is_none())
		.collect();
	missing.sort_unstable();
	missing.dedup();
	for name in &missing {
		log(LogLevel::Warning, &format!("No clip for \"{}\"", name));
	}
	if missing.is_empty() {
		log(LogLevel::Success, "Every catalog name has a clip");
	}
	Ok(missing.is_empty())
}

fn synth(settings: &Settings, phrases: Vec<String>, catalog_names: bool, overwrite: bool) -> Result<bool> {
	let mut wanted = phrases;
	if catalog_names {
		let catalog = NameCatalog::load(&settings.catalog)?;
		wanted.extend(catalog.course_names().map(str::to_string));
		wanted.extend(catalog.teacher_names().map(str::to_string));
	}
	if wanted.is_empty() {
		log(LogLevel::Warning, "Nothing to synthesize: pass phrases or --catalog-names");
		return Ok(true);
	}

	let tts = GoogleTts::new(&settings.language, settings.synthesis_timeout())?.with_endpoint(&settings.tts_endpoint);
	let report = build_library(&tts, wanted.iter().map(String::as_str), &settings.overlay_dir, overwrite)?;
	log(
		LogLevel::Info,
		&format!(
			"{} created, {} already present, {} failed",
			report.created.len(),
			report.skipped.len(),
			report.failed.len()
		),
	);
	Ok(report.failed.is_empty())
}
