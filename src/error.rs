// ══════════════════════════════════════════════════════════════════════════════
// ERROR MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// One error type for the whole pipeline. Input errors (bad filename, unknown
// codes, unreadable recording) are fatal for the podcast they belong to.
// Missing clips are not errors at all: the assembler collects them instead.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PodcastError>;

#[derive(Debug, Error)]
pub enum PodcastError {
	#[error("Invalid podcast file name '{name}': {reason}")]
	InvalidFilename { name: String, reason: String },

	#[error("Probably not a wave file: {path} ({reason})")]
	InvalidSource { path: PathBuf, reason: String },

	#[error("Course code '{0}' is not in the catalog")]
	UnknownCourse(String),

	#[error("Teacher code '{0}' is not in the catalog")]
	UnknownTeacher(String),

	#[error("Cut count must be at least 1, got {0}")]
	InvalidCutCount(usize),

	#[error("Cannot load catalog {path}: {reason}")]
	Catalog { path: PathBuf, reason: String },

	#[error("Cannot load settings {path}: {reason}")]
	Config { path: PathBuf, reason: String },

	#[error("{action} '{path}': {source}")]
	Io {
		action: &'static str,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Cannot decode audio {path}: {reason}")]
	Decode { path: PathBuf, reason: String },

	#[error("Cannot write wave file {path}: {source}")]
	Wav {
		path: PathBuf,
		#[source]
		source: hound::Error,
	},

	#[error("Cannot read or write tags on {path}: {source}")]
	Tags {
		path: PathBuf,
		#[source]
		source: lofty::error::LoftyError,
	},

	#[error("Encoder failed for {path}: {reason}")]
	Encode { path: PathBuf, reason: String },

	#[error("Speech synthesis failed for '{text}': {reason}")]
	Synthesis { text: String, reason: String },

	#[error("Upload of {path} failed: {reason}")]
	Upload { path: PathBuf, reason: String },

	#[error("Assembly of '{name}' aborted while {state}: {source}")]
	Aborted {
		name: String,
		state: &'static str,
		#[source]
		source: Box<PodcastError>,
	},
}

impl PodcastError {
	pub fn io(action: &'static str, path: &Path, source: std::io::Error) -> Self {
		PodcastError::Io { action, path: path.to_path_buf(), source }
	}

	pub fn decode(path: &Path, reason: impl ToString) -> Self {
		PodcastError::Decode { path: path.to_path_buf(), reason: reason.to_string() }
	}

	pub fn wav(path: &Path, source: hound::Error) -> Self {
		PodcastError::Wav { path: path.to_path_buf(), source }
	}

	pub fn tags(path: &Path, source: lofty::error::LoftyError) -> Self {
		PodcastError::Tags { path: path.to_path_buf(), source }
	}

	/// Input errors that no retry can fix.
	pub fn is_fatal_input(&self) -> bool {
		matches!(
			self,
			PodcastError::InvalidFilename { .. }
				| PodcastError::InvalidSource { .. }
				| PodcastError::UnknownCourse(_)
				| PodcastError::UnknownTeacher(_)
				| PodcastError::InvalidCutCount(_)
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fatal_input_classification() {
		assert!(PodcastError::UnknownCourse("XYZ".into()).is_fatal_input());
		assert!(PodcastError::InvalidCutCount(0).is_fatal_input());
		let synth = PodcastError::Synthesis { text: "ciao".into(), reason: "offline".into() };
		assert!(!synth.is_fatal_input());
	}

	#[test]
	fn messages_name_the_offending_code() {
		let err = PodcastError::UnknownTeacher("E_Cosimi".into());
		assert!(err.to_string().contains("E_Cosimi"));
	}
}
