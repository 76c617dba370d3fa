//! Podcast assembly for Fonderie Sonore lesson recordings.
//!
//! A raw recording is named after the lesson it holds. From that name alone the
//! crate builds a spoken intro, cuts the recording into slices separated by a
//! watermark clip, merges everything into one podcast file and records what the
//! landing page needs to link it.

pub mod assembler;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod identity;
pub mod inspect;
pub mod intro;
pub mod io;
pub mod library;
pub mod logger;
pub mod naming;
pub mod pipeline;
pub mod planner;
pub mod publish;
pub mod record;
pub mod synth;

#[cfg(test)]
pub mod test_support;

pub use assembler::{AssemblerOptions, AssemblyReport, AudioAssembler, MissingAudio, Outcome};
pub use catalog::NameCatalog;
pub use config::Settings;
pub use error::{PodcastError, Result};
pub use identity::PodcastIdentity;
pub use library::AudioLibraryIndex;
pub use pipeline::{collect_recordings, Pipeline, RunSummary};
pub use planner::CutCount;
pub use record::PublicationRecord;
