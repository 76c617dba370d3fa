// ══════════════════════════════════════════════════════════════════════════════
// PLANNER MODULE
// ══════════════════════════════════════════════════════════════════════════════
//
// Decides how many slices the raw recording is cut into and lays out the
// assembly plan: intro phrases first, then slice, watermark, slice, ... with no
// watermark after the last slice. The plan order is the concatenation order.

use std::fmt;
use crate::constants::{MIN_POSITION_WIDTH, ONE_HOUR_MS, SEGMENT_MARKER, TWO_HOURS_MS};
use crate::error::{PodcastError, Result};
use crate::intro::IntroScript;
use crate::library::normalize;

/// Automatic cut count for a recording of `total_ms` milliseconds.
///
/// A recording of exactly two hours gets 4 slices, not 5: the upper bound is
/// exclusive on the long side.
pub fn auto_cut_count(total_ms: u64) -> usize {
	if total_ms > TWO_HOURS_MS {
		5
	} else if total_ms > ONE_HOUR_MS {
		4
	} else {
		3
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutCount {
	#[default]
	Auto,
	Manual(usize),
}

impl CutCount {
	pub fn resolve(self, total_ms: u64) -> Result<usize> {
		match self {
			CutCount::Auto => Ok(auto_cut_count(total_ms)),
			CutCount::Manual(0) => Err(PodcastError::InvalidCutCount(0)),
			CutCount::Manual(n) => Ok(n),
		}
	}
}

impl From<Option<usize>> for CutCount {
	fn from(value: Option<usize>) -> Self {
		value.map_or(CutCount::Auto, CutCount::Manual)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanItem {
	/// Copy the library clip voicing this phrase.
	Clip { phrase: String },
	/// Export `[start_ms, end_ms)` of the raw recording.
	Slice { index: usize, start_ms: u64, end_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
	pub position: usize,
	pub item: PlanItem,
	/// Digits of the position prefix, shared by every entry of a plan.
	width: usize,
}

impl PlanEntry {
	/// Name of the staged file. The prefix is padded to the widest position of
	/// the plan, so directory order stays equal to plan order.
	pub fn staged_name(&self) -> String {
		match &self.item {
			PlanItem::Clip { phrase } => format!("{:0w$}_{}", self.position, normalize(phrase), w = self.width),
			PlanItem::Slice { .. } => format!("{:0w$}_{}.wav", self.position, SEGMENT_MARKER, w = self.width),
		}
	}
}

impl fmt::Display for PlanEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.item {
			PlanItem::Clip { phrase } => write!(f, "[{:>3}] clip   \"{}\"", self.position, phrase),
			PlanItem::Slice { index, start_ms, end_ms } => write!(
				f,
				"[{:>3}] slice  #{} {}ms..{}ms",
				self.position,
				index + 1,
				start_ms,
				end_ms
			),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyPlan {
	entries: Vec<PlanEntry>,
	pub total_ms: u64,
	pub segment_count: usize,
	pub cut_length_ms: u64,
}

impl AssemblyPlan {
	pub fn entries(&self) -> &[PlanEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Phrases the library must provide, in plan order.
	pub fn phrases(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().filter_map(|entry| match &entry.item {
			PlanItem::Clip { phrase } => Some(phrase.as_str()),
			PlanItem::Slice { .. } => None,
		})
	}
}

/// Digits needed for the last position of a plan with `len` entries.
fn position_width(len: usize) -> usize {
	let last = len.saturating_sub(1);
	let digits = last.checked_ilog10().map_or(1, |d| d as usize + 1);
	digits.max(MIN_POSITION_WIDTH)
}

pub struct SegmentPlanner {
	cuts: CutCount,
	watermark: String,
}

impl SegmentPlanner {
	pub fn new(cuts: CutCount, watermark: impl Into<String>) -> Self {
		Self { cuts, watermark: watermark.into() }
	}

	pub fn plan(&self, total_ms: u64, intro: &IntroScript) -> Result<AssemblyPlan> {
		let segments = self.cuts.resolve(total_ms)?;
		let cut_length_ms = total_ms.div_ceil(segments as u64);

		let mut items: Vec<PlanItem> = intro
			.phrases()
			.iter()
			.map(|phrase| PlanItem::Clip { phrase: phrase.clone() })
			.collect();

		let mut emitted = 0;
		for index in 0..segments {
			let start_ms = index as u64 * cut_length_ms;
			if start_ms >= total_ms {
				break;
			}
			if index > 0 {
				items.push(PlanItem::Clip { phrase: self.watermark.clone() });
			}
			let end_ms = (start_ms + cut_length_ms).min(total_ms);
			items.push(PlanItem::Slice { index, start_ms, end_ms });
			emitted += 1;
		}

		let width = position_width(items.len());
		let entries = items
			.into_iter()
			.enumerate()
			.map(|(position, item)| PlanEntry { position, item, width })
			.collect();

		Ok(AssemblyPlan { entries, total_ms, segment_count: emitted, cut_length_ms })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::Path;
	use crate::catalog::NameCatalog;
	use crate::identity::PodcastIdentity;
	use crate::intro::IntroScriptBuilder;

	fn intro(k: usize) -> IntroScript {
		let catalog = NameCatalog::default();
		let template: Vec<String> = (0..k).map(|i| format!("phrase_{}", i)).collect();
		let identity = PodcastIdentity::parse(Path::new("SEC6_20190228_E_Cosimi_Lezione_8_parte_1.wav")).unwrap();
		IntroScriptBuilder::new(&template).build(&identity, &catalog).unwrap()
	}

	#[test]
	fn automatic_cut_boundaries() {
		assert_eq!(auto_cut_count(3_000_000), 3);
		assert_eq!(auto_cut_count(3_600_000), 3);
		assert_eq!(auto_cut_count(3_600_001), 4);
		assert_eq!(auto_cut_count(7_200_000), 4);
		assert_eq!(auto_cut_count(7_200_001), 5);
	}

	#[test]
	fn manual_override_is_used_verbatim() {
		assert_eq!(CutCount::Manual(7).resolve(1_000).unwrap(), 7);
		assert_eq!(CutCount::from(None).resolve(3_600_001).unwrap(), 4);
		assert!(matches!(CutCount::Manual(0).resolve(1_000), Err(PodcastError::InvalidCutCount(0))));
	}

	#[test]
	fn plan_interleaves_slices_and_watermarks() {
		let script = intro(4);
		let plan = SegmentPlanner::new(CutCount::Auto, "fonderie_sonore").plan(3_000_000, &script).unwrap();
		assert_eq!(plan.segment_count, 3);
		assert_eq!(plan.len(), 4 + 3 + 2);
		assert_eq!(plan.cut_length_ms, 1_000_000);

		let entries = plan.entries();
		for (i, entry) in entries.iter().enumerate() {
			assert_eq!(entry.position, i);
		}
		for entry in &entries[..4] {
			assert!(matches!(entry.item, PlanItem::Clip { .. }));
		}
		let tail: Vec<bool> = entries[4..].iter().map(|e| matches!(e.item, PlanItem::Slice { .. })).collect();
		assert_eq!(tail, [true, false, true, false, true]);
		assert_eq!(entries[5].item, PlanItem::Clip { phrase: "fonderie_sonore".into() });
	}

	#[test]
	fn slices_cover_the_whole_recording() {
		let plan = SegmentPlanner::new(CutCount::Manual(3), "w").plan(10_000, &intro(0)).unwrap();
		let bounds: Vec<(u64, u64)> = plan
			.entries()
			.iter()
			.filter_map(|e| match e.item {
				PlanItem::Slice { start_ms, end_ms, .. } => Some((start_ms, end_ms)),
				_ => None,
			})
			.collect();
		assert_eq!(bounds, [(0, 3_334), (3_334, 6_668), (6_668, 10_000)]);
	}

	#[test]
	fn empty_trailing_slices_are_dropped() {
		let plan = SegmentPlanner::new(CutCount::Manual(4), "w").plan(5, &intro(1)).unwrap();
		assert_eq!(plan.segment_count, 3);
		assert_eq!(plan.len(), 1 + 3 + 2);
	}

	#[test]
	fn staged_names_sort_in_plan_order() {
		let plan = SegmentPlanner::new(CutCount::Manual(5), "Fonderie Sonore").plan(7_200_001, &intro(12)).unwrap();
		let names: Vec<String> = plan.entries().iter().map(PlanEntry::staged_name).collect();
		let mut sorted = names.clone();
		sorted.sort();
		assert_eq!(names, sorted);
		assert_eq!(names[0], "000_phrase_0.mp3");
		assert_eq!(names[12], "012_podcast_segment.wav");
		assert_eq!(names[13], "013_fonderie_sonore.mp3");
	}

	#[test]
	fn long_plans_widen_the_position_prefix() {
		let plan = SegmentPlanner::new(CutCount::Manual(600), "w").plan(3_000_000, &intro(1)).unwrap();
		assert_eq!(plan.len(), 1 + 600 + 599);
		let names: Vec<String> = plan.entries().iter().map(PlanEntry::staged_name).collect();
		let mut sorted = names.clone();
		sorted.sort();
		assert_eq!(names, sorted);
		assert_eq!(names[0], "0000_phrase_0.mp3");
		assert_eq!(names[100], "0100_w.mp3");
		assert_eq!(names[1_000], "1000_w.mp3");
	}

	#[test]
	fn prefix_width_never_drops_below_three() {
		assert_eq!(position_width(0), 3);
		assert_eq!(position_width(1_000), 3);
		assert_eq!(position_width(1_001), 4);
		assert_eq!(position_width(10_001), 5);
	}
}
