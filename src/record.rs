// ══════════════════════════════════════════════════════════════════════════════
// RECORD MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Accumulates what the landing page and the upload step need to know about one
// lesson: header fields plus one entry per part. Every writer merges into it;
// nothing here validates.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
	pub archive_name: String,
	pub registration_date: String,
	pub course_name: String,
	pub teacher_name: String,
	pub lesson: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartFields {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub server_path: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub link: Option<String>,
}

impl PartFields {
	fn update(&mut self, other: PartFields) {
		if other.duration.is_some() {
			self.duration = other.duration;
		}
		if other.path.is_some() {
			self.path = other.path;
		}
		if other.server_path.is_some() {
			self.server_path = other.server_path;
		}
		if other.link.is_some() {
			self.link = other.link;
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
	#[serde(flatten)]
	pub header: HeaderFields,
	parts: BTreeMap<String, PartFields>,
}

impl PublicationRecord {
	pub fn new() -> Self {
		Self::default()
	}

	/// Non-empty fields overwrite the current header.
	pub fn add_header(&mut self, fields: HeaderFields) {
		let HeaderFields { archive_name, registration_date, course_name, teacher_name, lesson } = fields;
		for (slot, value) in [
			(&mut self.header.archive_name, archive_name),
			(&mut self.header.registration_date, registration_date),
			(&mut self.header.course_name, course_name),
			(&mut self.header.teacher_name, teacher_name),
			(&mut self.header.lesson, lesson),
		] {
			if !value.is_empty() {
				*slot = value;
			}
		}
	}

	/// Updates the part entry if present, inserts it otherwise.
	pub fn add_part(&mut self, key: &str, fields: PartFields) {
		self.parts.entry(key.to_string()).or_default().update(fields);
	}

	pub fn merge(&mut self, other: PublicationRecord) {
		self.add_header(other.header);
		for (key, fields) in other.parts {
			self.add_part(&key, fields);
		}
	}

	pub fn part(&self, key: &str) -> Option<&PartFields> {
		self.parts.get(key)
	}

	/// Parts ordered by key ("Parte 1", "Parte 2", ...).
	pub fn parts(&self) -> impl Iterator<Item = (&String, &PartFields)> {
		self.parts.iter()
	}
}
