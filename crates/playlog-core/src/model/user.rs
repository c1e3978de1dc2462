use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A listener seen in the activity logs.
///
/// Only `level` is mutable: a later event for the same user refreshes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    /// Subscription level, `free` or `paid` in practice.
    pub level: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            first_name: None,
            last_name: None,
            gender: None,
            level: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// User ids must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.user_id <= 0 {
            return Err(Error::constraint("user", self.user_id));
        }
        Ok(())
    }
}
