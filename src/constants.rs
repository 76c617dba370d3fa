// ══════════════════════════════════════════════════════════════════════════════
// CONSTANTS MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Defines application-wide constants used throughout the codebase.
// - Italian month names used when the registration date is spoken
// - Cut-count thresholds for automatic segmenting
// - Working audio format defaults and staging file conventions

pub const MONTHS: [&str; 12] = [
	"Gennaio", "Febbraio", "Marzo", "Aprile", "Maggio", "Giugno",
	"Luglio", "Agosto", "Settembre", "Ottobre", "Novembre", "Dicembre",
];

pub const ONE_HOUR_MS: u64 = 3_600_000;
pub const TWO_HOURS_MS: u64 = 7_200_000;

/// Name given to staged slices of the raw recording.
pub const SEGMENT_MARKER: &str = "podcast_segment";

pub const CLIP_EXTENSION: &str = "mp3";

pub const DEFAULT_BITRATE: &str = "64k";
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
pub const DEFAULT_CHANNELS: u16 = 1;
pub const DEFAULT_LANGUAGE: &str = "it";
pub const DEFAULT_SYNTHESIS_TIMEOUT_SECS: u64 = 15;

/// Minimum width of the positional prefix given to staged files.
pub const MIN_POSITION_WIDTH: usize = 3;

pub const SCRATCH_PREFIX: &str = ".tmp_";
pub const OUTPUT_DIR_NAME: &str = "mp3";

pub const TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";
