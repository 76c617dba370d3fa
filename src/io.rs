// ══════════════════════════════════════════════════════════════════════════════
// I/O MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Shared filesystem utilities used by the assembler, the synthesizer and the
// publishing step. Every failure carries the path it happened on.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use crate::error::{PodcastError, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opens a file with a descriptive error message on failure.
pub fn open_file(path: &Path) -> Result<File> {
	File::open(path).map_err(|e| PodcastError::io("Cannot open file", path, e))
}

/// Creates a directory and its parents; an existing directory is fine.
pub fn ensure_dir(path: &Path) -> Result<()> {
	fs::create_dir_all(path).map_err(|e| PodcastError::io("Cannot create directory", path, e))
}

pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
	fs::copy(from, to).map_err(|e| PodcastError::io("Cannot copy file", from, e))
}

pub fn rename(from: &Path, to: &Path) -> Result<()> {
	fs::rename(from, to).map_err(|e| PodcastError::io("Cannot move file", from, e))
}

pub fn remove_dir_all(path: &Path) -> Result<()> {
	fs::remove_dir_all(path).map_err(|e| PodcastError::io("Cannot remove directory", path, e))
}

/// Regular files of `dir`, sorted by name.
pub fn sorted_files(dir: &Path) -> Result<Vec<PathBuf>> {
	let entries = fs::read_dir(dir).map_err(|e| PodcastError::io("Cannot list directory", dir, e))?;
	let mut files = Vec::new();
	for entry in entries {
		let entry = entry.map_err(|e| PodcastError::io("Cannot list directory", dir, e))?;
		let path = entry.path();
		if path.is_file() {
			files.push(path);
		}
	}
	files.sort();
	Ok(files)
}

/// Deletes every regular file directly inside `dir`. Returns how many went.
pub fn clear_files(dir: &Path) -> Result<usize> {
	let files = sorted_files(dir)?;
	for file in &files {
		fs::remove_file(file).map_err(|e| PodcastError::io("Cannot remove file", file, e))?;
	}
	Ok(files.len())
}

/// A hidden sibling path unique to this process and call, for write-then-rename.
/// The extension is kept so encoders and taggers still recognize the format.
pub fn temp_sibling(path: &Path) -> PathBuf {
	let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
	let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
	let name = match path.extension() {
		Some(ext) => format!(".{}.{}-{}.{}", stem, std::process::id(), n, ext.to_string_lossy()),
		None => format!(".{}.{}-{}", stem, std::process::id(), n),
	};
	path.with_file_name(name)
}

/// Writes `bytes` next to `path` and renames over it, so readers never see a
/// half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
	let temp = temp_sibling(path);
	if let Err(e) = fs::write(&temp, bytes) {
		let _ = fs::remove_file(&temp);
		return Err(PodcastError::io("Cannot write file", &temp, e));
	}
	rename(&temp, path)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sorted_files_orders_by_name_and_skips_dirs() {
		let dir = tempfile::tempdir().unwrap();
		for name in ["010_b.mp3", "002_a.wav", "001_c.mp3"] {
			fs::write(dir.path().join(name), b"x").unwrap();
		}
		fs::create_dir(dir.path().join("000_dir")).unwrap();
		let names: Vec<String> = sorted_files(dir.path())
			.unwrap()
			.iter()
			.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
			.collect();
		assert_eq!(names, ["001_c.mp3", "002_a.wav", "010_b.mp3"]);
	}

	#[test]
	fn atomic_writes_replace_and_leave_no_temp_files() {
		let dir = tempfile::tempdir().unwrap();
		let target = dir.path().join("clip.mp3");
		write_atomic(&target, b"first").unwrap();
		write_atomic(&target, b"second").unwrap();
		assert_eq!(fs::read(&target).unwrap(), b"second");
		assert_eq!(sorted_files(dir.path()).unwrap().len(), 1);
	}

	#[test]
	fn clear_files_keeps_the_directory() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("a"), b"x").unwrap();
		fs::write(dir.path().join("b"), b"x").unwrap();
		assert_eq!(clear_files(dir.path()).unwrap(), 2);
		assert!(dir.path().is_dir());
		assert!(sorted_files(dir.path()).unwrap().is_empty());
	}

	#[test]
	fn temp_siblings_are_hidden_unique_and_keep_the_extension() {
		let target = Path::new("/out/mp3/Lezione_8_parte_1_0badf00d.mp3");
		let a = temp_sibling(target);
		let b = temp_sibling(target);
		assert_ne!(a, b);
		assert_eq!(a.parent(), target.parent());
		assert_eq!(a.extension().unwrap(), "mp3");
		assert!(a.file_name().unwrap().to_string_lossy().starts_with('.'));
	}

	#[test]
	fn missing_files_name_their_path() {
		let err = open_file(Path::new("/definitely/not/here.wav")).unwrap_err();
		assert!(err.to_string().contains("/definitely/not/here.wav"));
	}
}
