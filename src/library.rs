// ══════════════════════════════════════════════════════════════════════════════
// LIBRARY MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Index of the pre-rendered spoken clips. Clip files are named after the phrase
// they voice: lower-cased, spaces turned into underscores, `.mp3` extension.
// Roots are scanned in order and later roots win, so the user overlay (where
// synthesized clips land) is passed last. The index is rebuilt for every
// assembly run and never writes to disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use glob::{MatchOptions, Pattern};
use crate::constants::CLIP_EXTENSION;
use crate::logger::{log, LogLevel};

/// Library file name for a spoken phrase.
pub fn normalize(phrase: &str) -> String {
	format!("{}.{}", phrase.trim().replace(' ', "_").to_lowercase(), CLIP_EXTENSION)
}

/// Spoken text for a library file name, the inverse of [`normalize`] modulo case.
pub fn spoken_text(file_name: &str) -> String {
	let stem = file_name
		.strip_suffix(&format!(".{}", CLIP_EXTENSION))
		.unwrap_or(file_name);
	stem.replace('_', " ")
}

#[derive(Debug, Clone, Default)]
pub struct AudioLibraryIndex {
	clips: HashMap<String, PathBuf>,
}

impl AudioLibraryIndex {
	pub fn scan<P: AsRef<Path>>(roots: &[P]) -> Self {
		let mut index = Self::default();
		for root in roots {
			index.scan_root(root.as_ref());
		}
		log(LogLevel::Debug, &format!("Audio library: {} clip(s) indexed", index.len()));
		index
	}

	fn scan_root(&mut self, root: &Path) {
		if !root.is_dir() {
			log(LogLevel::Debug, &format!("Audio library root not found, skipping: {}", root.display()));
			return;
		}

		let pattern = format!(
			"{}/**/*.{}",
			Pattern::escape(&root.to_string_lossy()),
			CLIP_EXTENSION
		);
		let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };

		let paths = match glob::glob_with(&pattern, options) {
			Ok(paths) => paths,
			Err(e) => {
				log(LogLevel::Warning, &format!("Cannot scan {}: {}", root.display(), e));
				return;
			}
		};

		for entry in paths.flatten() {
			let Some(file_name) = entry.file_name().and_then(|n| n.to_str()) else { continue };
			if file_name.starts_with('.') {
				continue;
			}
			let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
			if size == 0 {
				log(LogLevel::Warning, &format!("Invalid clip (empty file): {}", entry.display()));
				continue;
			}
			self.clips.insert(file_name.to_lowercase(), entry.clone());
		}
	}

	/// Full path of the clip voicing `phrase`, if the library has one.
	pub fn resolve(&self, phrase: &str) -> Option<PathBuf> {
		self.resolve_file(&normalize(phrase))
	}

	pub fn resolve_file(&self, file_name: &str) -> Option<PathBuf> {
		self.clips.get(&file_name.to_lowercase()).cloned()
	}

	/// Records a clip that was written after the scan.
	pub fn register(&mut self, file_name: &str, dir: &Path) {
		self.clips.insert(file_name.to_lowercase(), dir.join(file_name));
	}

	pub fn len(&self) -> usize {
		self.clips.len()
	}

	pub fn is_empty(&self) -> bool {
		self.clips.is_empty()
	}

	pub fn file_names(&self) -> impl Iterator<Item = &str> {
		self.clips.keys().map(String::as_str)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn normalizes_phrases() {
		assert_eq!(normalize("Fonderie Sonore Podcast"), "fonderie_sonore_podcast.mp3");
		assert_eq!(normalize("8ª Lezione"), "8ª_lezione.mp3");
		assert_eq!(spoken_text("enrico_cosimi.mp3"), "enrico cosimi");
	}

	#[test]
	fn overlay_wins_and_empty_files_are_skipped() {
		let shipped = tempfile::tempdir().unwrap();
		let overlay = tempfile::tempdir().unwrap();
		fs::create_dir(shipped.path().join("docenti")).unwrap();
		fs::write(shipped.path().join("docenti/enrico_cosimi.mp3"), b"shipped").unwrap();
		fs::write(shipped.path().join("broken.mp3"), b"").unwrap();
		fs::write(shipped.path().join(".hidden.mp3"), b"x").unwrap();
		fs::write(overlay.path().join("enrico_cosimi.mp3"), b"overlay").unwrap();

		let index = AudioLibraryIndex::scan(&[shipped.path(), overlay.path()]);
		assert_eq!(index.len(), 1);
		assert_eq!(index.resolve("Enrico Cosimi").unwrap(), overlay.path().join("enrico_cosimi.mp3"));
		assert!(index.resolve("broken").is_none());
	}

	#[test]
	fn missing_roots_and_registration() {
		let overlay = tempfile::tempdir().unwrap();
		let mut index = AudioLibraryIndex::scan(&[overlay.path().join("nope")]);
		assert!(index.is_empty());
		index.register("ciao.mp3", overlay.path());
		assert_eq!(index.resolve("Ciao").unwrap(), overlay.path().join("ciao.mp3"));
	}
}
