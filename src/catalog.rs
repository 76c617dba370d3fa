// ══════════════════════════════════════════════════════════════════════════════
// CATALOG MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Read-only name catalog: course and teacher codes to display names, the
// course server paths, the intro template and the watermark phrase. Loaded
// once per run from JSON and passed down by reference.

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{PodcastError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntry {
	pub course_name: String,
	pub course_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NameCatalog {
	#[serde(rename = "corsi", default)]
	courses: BTreeMap<String, CourseEntry>,
	#[serde(rename = "docenti", default)]
	teachers: BTreeMap<String, String>,
	#[serde(default)]
	intro: Vec<String>,
	#[serde(default)]
	watermark: String,
}

impl NameCatalog {
	pub fn load(path: &Path) -> Result<Self> {
		let text = std::fs::read_to_string(path).map_err(|e| PodcastError::Catalog {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		Self::from_json(&text).map_err(|e| match e {
			PodcastError::Catalog { reason, .. } => PodcastError::Catalog { path: path.to_path_buf(), reason },
			other => other,
		})
	}

	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text).map_err(|e| PodcastError::Catalog {
			path: "<inline>".into(),
			reason: e.to_string(),
		})
	}

	pub fn lookup_course(&self, course_code: &str) -> Result<&CourseEntry> {
		self.courses
			.get(course_code)
			.ok_or_else(|| PodcastError::UnknownCourse(course_code.to_string()))
	}

	pub fn lookup_teacher(&self, short_code: &str) -> Result<&str> {
		self.teachers
			.get(short_code)
			.map(String::as_str)
			.ok_or_else(|| PodcastError::UnknownTeacher(short_code.to_string()))
	}

	pub fn intro_template(&self) -> &[String] {
		&self.intro
	}

	pub fn watermark(&self) -> &str {
		&self.watermark
	}

	pub fn course_names(&self) -> impl Iterator<Item = &str> {
		self.courses.values().map(|c| c.course_name.as_str())
	}

	pub fn teacher_names(&self) -> impl Iterator<Item = &str> {
		self.teachers.values().map(String::as_str)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = r#"{
		"corsi": {
			"SEC": {"course_name": "Sound Engineering Course", "course_path": "PODCAST/SEC"}
		},
		"docenti": {"E_Cosimi": "Enrico Cosimi"},
		"intro": ["fonderie_sonore_podcast", "$VAR{course_name}"],
		"watermark": "fonderie sonore"
	}"#;

	#[test]
	fn lookups() {
		let catalog = NameCatalog::from_json(SAMPLE).unwrap();
		assert_eq!(catalog.lookup_course("SEC").unwrap().course_path, "PODCAST/SEC");
		assert_eq!(catalog.lookup_teacher("E_Cosimi").unwrap(), "Enrico Cosimi");
		assert_eq!(catalog.intro_template().len(), 2);
		assert_eq!(catalog.watermark(), "fonderie sonore");
	}

	#[test]
	fn unknown_codes_are_reported() {
		let catalog = NameCatalog::from_json(SAMPLE).unwrap();
		assert!(matches!(catalog.lookup_course("ALP"), Err(PodcastError::UnknownCourse(c)) if c == "ALP"));
		assert!(matches!(catalog.lookup_teacher("A_Rossi"), Err(PodcastError::UnknownTeacher(_))));
	}

	#[test]
	fn malformed_json_is_a_catalog_error() {
		assert!(matches!(NameCatalog::from_json("{corsi"), Err(PodcastError::Catalog { .. })));
	}
}
