use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::require_key;

/// A recording artist as described by the song metadata files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Artist {
    #[must_use]
    pub fn new(artist_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            artist_id: artist_id.into(),
            name: name.into(),
            location: None,
            latitude: None,
            longitude: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Check the invariants the `artists` table enforces.
    pub fn validate(&self) -> Result<()> {
        require_key("artist", &self.artist_id)?;
        if self.name.is_empty() {
            return Err(Error::constraint("artist", self));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_new() {
        let artist = Artist::new("ARD7TVE1187B99BFB1", "Casual");
        assert_eq!(artist.name, "Casual");
        assert!(artist.location.is_none());
        assert!(artist.validate().is_ok());
    }

    #[test]
    fn test_artist_builder() {
        let artist = Artist::new("AR8IEZO1187B99055E", "Marc Shaiman")
            .with_location("California - LA")
            .with_coordinates(34.05, -118.24);

        assert_eq!(artist.location.as_deref(), Some("California - LA"));
        assert_eq!(artist.latitude, Some(34.05));
        assert_eq!(artist.longitude, Some(-118.24));
    }

    #[test]
    fn test_artist_requires_name_and_id() {
        assert!(Artist::new("AR1", "").validate().is_err());
        let err = Artist::new("  ", "Casual").validate().unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
