use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while acquiring a pose
#[derive(Debug, Error)]
pub enum PoseError {
    #[error("keypoint '{name}' has a non-finite coordinate ({x}, {y})")]
    NonFiniteCoordinate { name: &'static str, x: f64, y: f64 },

    #[error("failed to read pose file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pose file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no more poses to capture")]
    Exhausted,
}
