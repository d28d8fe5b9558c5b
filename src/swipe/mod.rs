//! Swipeable list rows.
//!
//! - [`machine`]: pure transition function over row position and events
//! - [`row`]: per-row controller owning offset, phase and the auto-close timer
//! - [`registry`]: single-open-row bookkeeping held by the list owner
//! - [`list`]: the list container wiring rows, registry, timers and callbacks

pub mod list;
pub mod machine;
pub mod registry;
pub mod row;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::error::{Result, SwipeError};

pub use list::{RowActions, SwipeList};
pub use machine::{RowPhase, SwipeGeometry};
pub use registry::RowRegistry;
pub use row::{Motion, RowOutcome, RowSnapshot, SwipeRowController};

/// Tunables shared by every row of a list
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeSettings {
    /// Width reserved for the action buttons
    pub action_width: f32,
    /// Fraction of `action_width` a release must pass to commit open
    pub open_ratio: f32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "auto_close_ms")]
    pub auto_close: Duration,
}

impl Default for SwipeSettings {
    fn default() -> Self {
        Self {
            action_width: 120.0,
            open_ratio: 0.5,
            auto_close: Duration::from_secs(5),
        }
    }
}

impl SwipeSettings {
    pub fn geometry(&self) -> Result<SwipeGeometry> {
        SwipeGeometry::new(self.action_width, self.open_ratio)
    }

    pub fn validate(&self) -> Result<()> {
        self.geometry()?;
        if self.auto_close.is_zero() {
            return Err(SwipeError::ZeroDuration {
                name: "auto-close delay",
            });
        }
        Ok(())
    }
}
