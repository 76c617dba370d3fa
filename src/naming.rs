// ══════════════════════════════════════════════════════════════════════════════
// NAMING MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Derives the published file name of an assembled podcast and where it lives
// on the server. The name is a pure function of the recording's file name, so
// a re-run finds the artifact of an earlier run and skips the work.

use crc32fast::Hasher;
use crate::audio::OutputFormat;
use crate::catalog::NameCatalog;
use crate::error::Result;
use crate::identity::PodcastIdentity;

/// `<lesson>_<part>_<crc32 of the file stem>.<ext>`
pub fn compute_name(identity: &PodcastIdentity, format: OutputFormat) -> String {
	let mut hasher = Hasher::new();
	hasher.update(identity.stem().as_bytes());
	format!(
		"{}_{:08x}.{}",
		identity.lesson_part_suffix(),
		hasher.finalize(),
		format.extension()
	)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
	pub file_name: String,
	/// Remote directory holding every part of the course edition.
	pub server_path: String,
	/// Public URL of this file.
	pub link: String,
}

pub struct ArtifactNamer<'a> {
	catalog: &'a NameCatalog,
	base_url: &'a str,
	format: OutputFormat,
}

impl<'a> ArtifactNamer<'a> {
	pub fn new(catalog: &'a NameCatalog, base_url: &'a str, format: OutputFormat) -> Self {
		Self { catalog, base_url, format }
	}

	pub fn locate(&self, identity: &PodcastIdentity) -> Result<ArtifactLocation> {
		let course = self.catalog.lookup_course(&identity.course_code)?;
		let file_name = compute_name(identity, self.format);
		let server_path = join_url(&[self.base_url, &course.course_path, identity.course_token()]);
		let link = join_url(&[&server_path, &file_name]);
		Ok(ArtifactLocation { file_name, server_path, link })
	}
}

fn join_url(parts: &[&str]) -> String {
	parts
		.iter()
		.map(|p| p.trim_matches('/'))
		.filter(|p| !p.is_empty())
		.collect::<Vec<_>>()
		.join("/")
}
