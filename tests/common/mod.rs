use std::f32::consts::PI;
use std::path::Path;
use hound::{SampleFormat, WavSpec, WavWriter};

pub const CATALOG: &str = r#"{
	"corsi": {
		"SEC": {"course_name": "Sound Engineering", "course_path": "PODCAST/SEC"},
		"ALP": {"course_name": "Ableton Live Production", "course_path": "PODCAST/ALP"}
	},
	"docenti": {"E_Cosimi": "Enrico Cosimi", "A_Rossi": "Andrea Rossi"},
	"intro": ["fonderie_sonore_podcast", "$VAR{course_name}", "docente", "$VAR{teacher_name}", "$VAR{lesson_number}", "$VAR{part_number}"],
	"watermark": "fonderie sonore"
}"#;

pub fn write_tone(path: &Path, ms: u64, rate: u32) {
	let spec = WavSpec { channels: 1, sample_rate: rate, bits_per_sample: 16, sample_format: SampleFormat::Int };
	let mut writer = WavWriter::create(path, spec).unwrap();
	for frame in 0..ms * rate as u64 / 1000 {
		let t = frame as f32 / rate as f32;
		writer.write_sample(((2.0 * PI * 330.0 * t).sin() * 8_000.0) as i16).unwrap();
	}
	writer.finalize().unwrap();
}

/// Writes a clip for each phrase, named the way the library expects.
pub fn write_clips(dir: &Path, phrases: &[&str]) {
	std::fs::create_dir_all(dir).unwrap();
	for phrase in phrases {
		let name = format!("{}.mp3", phrase.replace(' ', "_").to_lowercase());
		write_tone(&dir.join(name), 100, 8_000);
	}
}
