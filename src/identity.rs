// ══════════════════════════════════════════════════════════════════════════════
// IDENTITY MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Decodes the structured name of a raw lesson recording into typed metadata.
// Names always look like SEC6_20190228_E_Cosimi_Lezione_8_parte_1.wav:
//   [0] course + edition   [1] registration date   [2..4] teacher code
//   [4..6] lesson          [6..] part
// Pure: no catalog lookups and no filesystem access happen here.

use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use crate::constants::MONTHS;
use crate::error::{PodcastError, Result};

static FILENAME_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^[a-z]{3}(\d{1,3}|[a-z]{1,3})_\d{8}_[a-z]_[a-z]+_lezione_\d{1,2}_parte_\d{1,2}\.wav$")
		.expect("filename grammar is a valid regex")
});

static COURSE_CODE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^([A-Za-z]{3})([A-Za-z]{1,3}|\d{1,3})$").expect("course grammar is a valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDate {
	/// Day exactly as written in the file name (two digits).
	pub day: String,
	pub month: u32,
	pub month_name: &'static str,
	pub year: String,
}

impl RegistrationDate {
	fn parse(token: &str, name: &str) -> Result<Self> {
		let (year, rest) = token.split_at(4);
		let (month, day) = rest.split_at(2);
		let month_number: u32 = month.parse().unwrap_or(0);
		let month_name = month_number
			.checked_sub(1)
			.and_then(|i| MONTHS.get(i as usize))
			.copied()
			.ok_or_else(|| invalid(name, &format!("month '{}' does not exist", month)))?;

		Ok(Self {
			day: day.to_string(),
			month: month_number,
			month_name,
			year: year.to_string(),
		})
	}

	/// "DD/Month/YYYY", the form shown on the landing page.
	pub fn formatted(&self) -> String {
		format!("{}/{}/{}", self.day, self.month_name, self.year)
	}
}

/// Metadata carried by the name of one raw lesson recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodcastIdentity {
	stem: String,
	tokens: Vec<String>,
	pub course_code: String,
	pub edition: String,
	pub date: RegistrationDate,
	pub teacher_code: String,
	pub lesson: u32,
	pub part: u32,
}

fn invalid(name: &str, reason: &str) -> PodcastError {
	PodcastError::InvalidFilename { name: name.to_string(), reason: reason.to_string() }
}

impl PodcastIdentity {
	/// Parses the basename of `path`; directories in front of it are ignored.
	pub fn parse(path: &Path) -> Result<Self> {
		let file_name = path
			.file_name()
			.and_then(|n| n.to_str())
			.ok_or_else(|| invalid(&path.display().to_string(), "not a file name"))?;

		if !FILENAME_GRAMMAR.is_match(file_name) {
			return Err(invalid(
				file_name,
				"expected <COURSE><EDITION>_<YYYYMMDD>_<I>_<Surname>_Lezione_<N>_parte_<M>.wav",
			));
		}

		let stem = &file_name[..file_name.len() - ".wav".len()];
		let tokens: Vec<String> = stem.split('_').map(str::to_string).collect();

		let captures = COURSE_CODE
			.captures(&tokens[0])
			.ok_or_else(|| invalid(file_name, "course code must be 3 letters plus an edition"))?;
		let course_code = captures[1].to_string();
		let edition = captures[2].to_string();

		let date = RegistrationDate::parse(&tokens[1], file_name)?;
		let teacher_code = tokens[2..4].join("_");
		let lesson = tokens[5].parse().map_err(|_| invalid(file_name, "lesson is not a number"))?;
		let part = tokens[7].parse().map_err(|_| invalid(file_name, "part is not a number"))?;

		Ok(Self {
			stem: stem.to_string(),
			tokens,
			course_code,
			edition,
			date,
			teacher_code,
			lesson,
			part,
		})
	}

	/// File name without the `.wav` extension.
	pub fn stem(&self) -> &str {
		&self.stem
	}

	/// Course code with its edition, e.g. `SEC6`.
	pub fn course_token(&self) -> &str {
		&self.tokens[0]
	}

	/// Everything but the part suffix: shared by all parts of one lesson.
	pub fn archive_name(&self) -> String {
		self.tokens[..self.tokens.len() - 2].join("_")
	}

	/// Lesson and part tokens, e.g. `Lezione_8_parte_1`.
	pub fn lesson_part_suffix(&self) -> String {
		self.tokens[4..].join("_")
	}

	/// Label shown on the landing page, e.g. `N.8`.
	pub fn lesson_label(&self) -> String {
		format!("N.{}", self.tokens[5])
	}

	/// Spoken lesson phrase, e.g. `8ª Lezione`.
	pub fn spoken_lesson(&self) -> String {
		format!("{}ª {}", self.tokens[5], self.tokens[4])
	}

	/// Spoken part phrase, e.g. `parte 1ª`.
	pub fn spoken_part(&self) -> String {
		format!("{}ª", self.tokens[6..].join(" "))
	}

	/// Key of this part in the publication record, e.g. `Parte 1`.
	pub fn part_key(&self) -> String {
		self.tokens[self.tokens.len() - 2..]
			.iter()
			.map(|word| title_case(word))
			.collect::<Vec<_>>()
			.join(" ")
	}
}

fn title_case(word: &str) -> String {
	let mut chars = word.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
		None => String::new(),
	}
}
