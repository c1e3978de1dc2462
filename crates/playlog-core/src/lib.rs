//! Core domain model for playlog.
//!
//! This crate defines the five analytics entities (songs, artists, users,
//! time and songplays), the `Loader` contract the extraction pipelines write
//! through, and two stores implementing it: a SQLite `Database` and an
//! in-memory `MemoryStore`.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod memory;
pub mod model;
pub mod schema;
pub mod store;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use schema::Database;
pub use store::{Loader, Transactional};
