//! Extraction pipelines for playlog.
//!
//! Song metadata files feed the `songs` and `artists` tables; activity logs
//! feed `time`, `users` and `songplays`. The walker runs a pipeline over a
//! directory tree with one transaction per file, and the treadle stages chain
//! the two walks into a workflow.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod activity;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod song;
pub mod stage;
pub mod walker;
pub mod work_item;

pub use activity::{load_log_events, process_log_file, LogFileSummary};
pub use config::Config;
pub use error::{EtlError, EtlResult};
pub use pipeline::build_pipeline;
pub use record::{sanitize, LogEvent, SongRecord};
pub use song::{load_song_records, process_song_file, SongFileSummary};
pub use stage::{LogStage, SongStage};
pub use walker::{discover_files, process_data, WalkOptions, WalkSummary};
pub use work_item::LoadRun;
