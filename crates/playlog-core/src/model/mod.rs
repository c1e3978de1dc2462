pub mod artist;
pub mod song;
pub mod songplay;
pub mod time;
pub mod user;

pub use artist::Artist;
pub use song::Song;
pub use songplay::{SongIdentity, Songplay, SongplayId};
pub use time::TimeDimension;
pub use user::User;

/// Row counts for every table the loader writes to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub songs: u64,
    pub artists: u64,
    pub users: u64,
    pub time: u64,
    pub songplays: u64,
}

/// Reject empty or whitespace-only key values.
pub(crate) fn require_key(entity: &'static str, key: &str) -> crate::Result<()> {
    if key.trim().is_empty() {
        return Err(crate::Error::constraint(entity, key));
    }
    Ok(())
}
