use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("constraint violation on {entity}: {value}")]
    ConstraintViolation { entity: &'static str, value: String },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Build a constraint violation for `entity` carrying the offending value.
    pub fn constraint(entity: &'static str, value: impl std::fmt::Debug) -> Self {
        Self::ConstraintViolation {
            entity,
            value: format!("{value:?}"),
        }
    }

    /// Returns `true` when a write was rejected by an entity invariant or a
    /// store constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::ConstraintViolation { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
