// ══════════════════════════════════════════════════════════════════════════════
// INTRO MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Expands the catalog's intro template into the phrases spoken before the
// lesson. Template entries are either literal phrases (written with underscores,
// like the clip files) or `$VAR{...}` placeholders filled from the recording's
// name and the catalog.

use crate::catalog::NameCatalog;
use crate::identity::PodcastIdentity;
use crate::logger::{log, LogLevel};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
	CourseName,
	TeacherName,
	LessonNumber,
	PartNumber,
	Day,
	Month,
	Year,
}

impl Placeholder {
	pub fn from_key(key: &str) -> Option<Self> {
		match key {
			"course_name" => Some(Placeholder::CourseName),
			"teacher_name" => Some(Placeholder::TeacherName),
			"lesson_number" => Some(Placeholder::LessonNumber),
			"part_number" => Some(Placeholder::PartNumber),
			"day" => Some(Placeholder::Day),
			"month" => Some(Placeholder::Month),
			"year" => Some(Placeholder::Year),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroToken {
	Literal(String),
	Variable(Placeholder),
}

impl IntroToken {
	pub fn parse(raw: &str) -> Self {
		let key = raw.strip_prefix("$VAR{").and_then(|rest| rest.strip_suffix('}'));
		match key {
			Some(key) => match Placeholder::from_key(key) {
				Some(placeholder) => IntroToken::Variable(placeholder),
				None => {
					log(LogLevel::Warning, &format!("Unknown intro placeholder '{}', spoken as is", raw));
					IntroToken::Literal(raw.to_string())
				}
			},
			None => IntroToken::Literal(raw.to_string()),
		}
	}
}

/// Ordered phrases voiced for one podcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntroScript {
	phrases: Vec<String>,
}

impl IntroScript {
	pub fn phrases(&self) -> &[String] {
		&self.phrases
	}

	pub fn len(&self) -> usize {
		self.phrases.len()
	}

	pub fn is_empty(&self) -> bool {
		self.phrases.is_empty()
	}
}

pub struct IntroScriptBuilder {
	tokens: Vec<IntroToken>,
}

impl IntroScriptBuilder {
	pub fn new<S: AsRef<str>>(template: &[S]) -> Self {
		Self { tokens: template.iter().map(|raw| IntroToken::parse(raw.as_ref())).collect() }
	}

	pub fn from_catalog(catalog: &NameCatalog) -> Self {
		Self::new(catalog.intro_template())
	}

	pub fn build(&self, identity: &PodcastIdentity, catalog: &NameCatalog) -> Result<IntroScript> {
		let mut phrases = Vec::with_capacity(self.tokens.len());
		for token in &self.tokens {
			let phrase = match token {
				IntroToken::Literal(text) => text.replace('_', " "),
				IntroToken::Variable(Placeholder::CourseName) => {
					catalog.lookup_course(&identity.course_code)?.course_name.clone()
				}
				IntroToken::Variable(Placeholder::TeacherName) => {
					catalog.lookup_teacher(&identity.teacher_code)?.to_string()
				}
				IntroToken::Variable(Placeholder::LessonNumber) => identity.spoken_lesson(),
				IntroToken::Variable(Placeholder::PartNumber) => identity.spoken_part(),
				IntroToken::Variable(Placeholder::Day) => identity.date.day.clone(),
				IntroToken::Variable(Placeholder::Month) => identity.date.month_name.to_string(),
				IntroToken::Variable(Placeholder::Year) => identity.date.year.clone(),
			};
			phrases.push(phrase);
		}
		Ok(IntroScript { phrases })
	}
}
