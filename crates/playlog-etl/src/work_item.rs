use serde::{Deserialize, Serialize};
use std::fmt;
use treadle::WorkItem;

/// One load run.
///
/// This is the treadle `WorkItem` that flows through the songs → logs
/// stages. Every run gets its own id so a finished run never masks a new
/// one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRun {
    id: String,
}

impl LoadRun {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// A run whose id is derived from the current time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(format!(
            "load-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        ))
    }
}

impl WorkItem for LoadRun {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for LoadRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
