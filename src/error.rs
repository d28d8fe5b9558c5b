use thiserror::Error;

/// Errors raised while building swipe settings or touching the record store.
///
/// Gesture handling itself never fails; malformed input is ignored.
#[derive(Error, Debug)]
pub enum SwipeError {
    #[error("Invalid action width: {width} (must be finite and greater than zero)")]
    InvalidActionWidth { width: f32 },

    #[error("Invalid open ratio: {ratio} (must be strictly between 0 and 1)")]
    InvalidOpenRatio { ratio: f32 },

    #[error("Invalid {name}: must be greater than zero")]
    ZeroDuration { name: &'static str },

    #[error("Invalid column width: {width} (must be finite and greater than zero)")]
    InvalidColumnWidth { width: f32 },

    #[error("Unsupported config version: {version}")]
    UnsupportedVersion { version: u32 },

    #[error("Client not found: {id}")]
    ClientNotFound { id: String },

    #[error("Duplicate client id: {id}")]
    DuplicateClient { id: String },

    #[error("Client name must not be empty")]
    EmptyClientName,

    #[error("Client file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed client file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize clients: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, SwipeError>;
