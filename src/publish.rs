// ══════════════════════════════════════════════════════════════════════════════
// PUBLISH MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// What happens to a lesson once all of its parts are assembled: the artifacts
// go to the server and a landing page snippet is rendered and archived.
//
// Uploads go through the `Uploader` trait. `MirrorUploader` copies into a local
// directory laid out like the server (a mounted share or a staging tree that
// gets synced); `DryRunUploader` only logs what would have been sent.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use crate::error::{PodcastError, Result};
use crate::io::{copy_file, ensure_dir, rename, temp_sibling, write_atomic};
use crate::logger::{log, LogLevel};
use crate::record::PublicationRecord;

pub trait Uploader: Send + Sync {
	/// Checks that `remote_dir` exists and creates it when it does not.
	fn ensure_remote_dir(&self, remote_dir: &str) -> Result<()>;

	/// Sends `local` into `remote_dir`, which has already been ensured.
	fn upload(&self, local: &Path, remote_dir: &str) -> Result<()>;
}

/// Remote directory for a server path: the scheme is not part of it.
pub fn remote_dir(server_path: &str) -> String {
	let path = server_path
		.strip_prefix("https://")
		.or_else(|| server_path.strip_prefix("http://"))
		.unwrap_or(server_path);
	path.trim_end_matches('/').to_string()
}

pub struct MirrorUploader {
	root: PathBuf,
}

impl MirrorUploader {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	fn local_dir(&self, remote_dir: &str) -> PathBuf {
		remote_dir
			.split('/')
			.filter(|part| !part.is_empty() && *part != "." && *part != "..")
			.fold(self.root.clone(), |dir, part| dir.join(part))
	}
}

impl Uploader for MirrorUploader {
	fn ensure_remote_dir(&self, remote_dir: &str) -> Result<()> {
		let dir = self.local_dir(remote_dir);
		if !dir.is_dir() {
			log(LogLevel::Info, &format!("Remote folder {} does not exist, creating it", remote_dir));
		}
		ensure_dir(&dir)
	}

	fn upload(&self, local: &Path, remote_dir: &str) -> Result<()> {
		let file_name = local.file_name().ok_or_else(|| PodcastError::Upload {
			path: local.to_path_buf(),
			reason: "not a file".into(),
		})?;
		let dest = self.local_dir(remote_dir).join(file_name);
		let temp = temp_sibling(&dest);
		if let Err(e) = copy_file(local, &temp) {
			let _ = std::fs::remove_file(&temp);
			return Err(PodcastError::Upload { path: local.to_path_buf(), reason: e.to_string() });
		}
		rename(&temp, &dest)?;
		log(LogLevel::Success, &format!("Uploaded {} to {}", local.display(), remote_dir));
		Ok(())
	}
}

pub struct DryRunUploader;

impl Uploader for DryRunUploader {
	fn ensure_remote_dir(&self, remote_dir: &str) -> Result<()> {
		log(LogLevel::Debug, &format!("Dry run: would check remote folder {}", remote_dir));
		Ok(())
	}

	fn upload(&self, local: &Path, remote_dir: &str) -> Result<()> {
		log(LogLevel::Info, &format!("Dry run: would upload {} to {}", local.display(), remote_dir));
		Ok(())
	}
}

/// Optional inline player in front of each download link.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
	pub media_player: bool,
	pub plugin_url: String,
}

fn escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	out
}

/// Renders the landing page snippet: credentials, then one block per part.
pub fn render_page(record: &PublicationRecord, options: &PageOptions) -> String {
	let header = &record.header;
	let mut page = String::new();
	page.push_str("<hr />\n<div class=\"virgil_podcast_info\">\n");
	for (label, value) in [
		("Docente:", &header.teacher_name),
		("Data:", &header.registration_date),
		("Lezione:", &header.lesson),
	] {
		let _ = writeln!(
			page,
			"  <span class=\"virgil_description\">{}</span><span class=\"virgil_credentials\">{}</span><br />",
			label,
			escape(value)
		);
	}
	page.push_str("  <hr />\n  <div class=\"virgil_podcast_part\">\n");

	for (key, part) in record.parts() {
		let duration = part.duration.as_deref().unwrap_or("-");
		let _ = writeln!(page, "    <p>{} | Durata {}</p>", escape(key), escape(duration));
		let Some(link) = part.link.as_deref() else { continue };
		let link = escape(link);
		if options.media_player {
			let _ = writeln!(
				page,
				"    <object id=\"audioplayer1\" width=\"290\" height=\"24\" data=\"{}\" type=\"application/x-shockwave-flash\">\
				<param name=\"FlashVars\" value=\"playerID=1&amp;soundFile={}\" /></object>",
				escape(&options.plugin_url),
				link
			);
		}
		let _ = writeln!(
			page,
			"    <a download=\"download\" href=\"{}\" target=\"_blank\"><button class=\"virgil_button\">Download</button></a>",
			link
		);
	}
	page.push_str("  </div>\n</div>\n");
	page
}

/// Archive file name: `<%m.%d.%Y_%H-%M>_<archive name>.html`.
pub fn archive_file_name(archive_name: &str, now: DateTime<Local>) -> String {
	format!("{}_{}.html", now.format("%m.%d.%Y_%H-%M"), archive_name)
}

/// Writes `page` into the archive directory and returns its path.
pub fn write_archive(archive_dir: &Path, record: &PublicationRecord, page: &str) -> Result<PathBuf> {
	ensure_dir(archive_dir)?;
	let path = archive_dir.join(archive_file_name(&record.header.archive_name, Local::now()));
	write_atomic(&path, page.as_bytes())?;
	log(LogLevel::Success, &format!("Landing page archived: {}", path.display()));
	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;
	use crate::record::{HeaderFields, PartFields};

	fn record() -> PublicationRecord {
		let mut record = PublicationRecord::new();
		record.add_header(HeaderFields {
			archive_name: "SEC6_20190228_E_Cosimi_Lezione_8".into(),
			registration_date: "28/Febbraio/2019".into(),
			course_name: "Sound Engineering".into(),
			teacher_name: "Enrico Cosimi".into(),
			lesson: "N.8".into(),
		});
		for n in [2, 1] {
			record.add_part(&format!("Parte {}", n), PartFields {
				duration: Some("0h 50m 00s".into()),
				link: Some(format!("https://example.org/SEC6/Lezione_8_parte_{}.mp3", n)),
				..Default::default()
			});
		}
		record
	}

	#[test]
	fn page_lists_credentials_and_parts_in_order() {
		let page = render_page(&record(), &PageOptions::default());
		assert!(page.contains(">Enrico Cosimi<"));
		assert!(page.contains(">28/Febbraio/2019<"));
		let first = page.find("Parte 1 | Durata 0h 50m 00s").unwrap();
		let second = page.find("Parte 2 | Durata 0h 50m 00s").unwrap();
		assert!(first < second);
		assert!(page.contains("href=\"https://example.org/SEC6/Lezione_8_parte_1.mp3\""));
		assert!(!page.contains("<object"));
	}

	#[test]
	fn media_player_is_optional_and_values_are_escaped() {
		let mut record = record();
		record.add_header(HeaderFields { teacher_name: "Rock & <Roll>".into(), ..Default::default() });
		let options = PageOptions { media_player: true, plugin_url: "https://example.org/player.swf".into() };
		let page = render_page(&record, &options);
		assert_eq!(page.matches("<object").count(), 2);
		assert!(page.contains("Rock &amp; &lt;Roll&gt;"));
	}

	#[test]
	fn archive_names_avoid_colons() {
		let now = Local.with_ymd_and_hms(2019, 2, 28, 14, 5, 0).unwrap();
		assert_eq!(archive_file_name("SEC6_x", now), "02.28.2019_14-05_SEC6_x.html");
	}

	#[test]
	fn remote_dirs_drop_the_scheme() {
		assert_eq!(remote_dir("https://example.org/PODCAST/SEC/SEC6/"), "example.org/PODCAST/SEC/SEC6");
		assert_eq!(remote_dir("test/podcast"), "test/podcast");
	}

	#[test]
	fn mirror_uploads_land_under_the_remote_dir() {
		let root = tempfile::tempdir().unwrap();
		let src = tempfile::tempdir().unwrap();
		let file = src.path().join("Lezione_8_parte_1_0badf00d.mp3");
		std::fs::write(&file, b"podcast").unwrap();

		let uploader = MirrorUploader::new(root.path());
		let remote = remote_dir("https://example.org/PODCAST/SEC/SEC6");
		uploader.ensure_remote_dir(&remote).unwrap();
		uploader.upload(&file, &remote).unwrap();

		let landed = root.path().join("example.org/PODCAST/SEC/SEC6/Lezione_8_parte_1_0badf00d.mp3");
		assert_eq!(std::fs::read(landed).unwrap(), b"podcast");
	}

	#[test]
	fn archive_is_written_to_disk() {
		let dir = tempfile::tempdir().unwrap();
		let record = record();
		let path = write_archive(dir.path(), &record, "<hr />").unwrap();
		assert!(path.file_name().unwrap().to_string_lossy().ends_with("_SEC6_20190228_E_Cosimi_Lezione_8.html"));
		assert_eq!(std::fs::read_to_string(path).unwrap(), "<hr />");
	}
}
