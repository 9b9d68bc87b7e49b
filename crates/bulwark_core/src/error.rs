//! Error types for the simulation core.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// A system was registered twice under the same name.
    #[error("Duplicate system name: '{0}'")]
    DuplicateSystem(String),

    /// A `runs after` constraint names a system that was never registered.
    #[error("System '{system}' declares ordering after unknown system '{after}'")]
    UnknownOrderingTarget {
        /// The system carrying the constraint.
        system: String,
        /// The missing predecessor.
        after: String,
    },

    /// A `runs after` constraint crosses stages. Ordering between stages
    /// comes from stage declaration order alone.
    #[error("System '{system}' declares ordering after '{after}' in a different stage")]
    CrossStageOrdering {
        /// The system carrying the constraint.
        system: String,
        /// The predecessor in another stage.
        after: String,
    },

    /// An external collaborator required by a system is not installed.
    ///
    /// This is carried in tick reports, never propagated as a tick failure:
    /// the dependent system skips its work for the tick.
    #[error("Missing collaborator '{0}' - system skipped this tick")]
    MissingCollaborator(&'static str),

    /// Unit stat record failed to parse.
    #[error("Failed to parse stat table: {0}")]
    StatParseError(String),

    /// Invalid simulation state detected.
    #[error("Invalid simulation state: {0}")]
    InvalidState(String),
}
