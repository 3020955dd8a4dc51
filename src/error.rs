//! Error types for the DEM engine.
//!
//! Configuration problems are reported before the first step. Everything
//! else is raised while stepping and ends the run in the `Fail` state.

use thiserror::Error;

/// Kind of entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Grain,
    Wire,
    Membrane,
    Plate,
    Contact,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Grain => "grain",
            Self::Wire => "wire",
            Self::Membrane => "membrane",
            Self::Plate => "plate",
            Self::Contact => "contact",
        };
        f.write_str(name)
    }
}

/// Main error type of the engine.
#[derive(Debug, Error)]
pub enum DemError {
    /// A parameter is missing, malformed or out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// A pre-reserved store or cell list is full.
    #[error("{kind} capacity exceeded ({capacity})")]
    Capacity { kind: EntityKind, capacity: usize },

    /// Positions left the region a spatial index can represent.
    #[error("{kind} #{index} outside spatial index domain: {detail}")]
    Domain {
        kind: EntityKind,
        index: usize,
        detail: String,
    },

    /// A position, velocity or force became NaN or infinite.
    #[error("non-finite {quantity} on {kind} #{index}")]
    NonFinite {
        kind: EntityKind,
        index: usize,
        quantity: &'static str,
    },

    /// Result or snapshot output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DemError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenient result alias for engine operations.
pub type Result<T> = std::result::Result<T, DemError>;
