//! Line-item production status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Production status of one plan line item
///
/// Wire strings match the backend's choices, including the legacy space in
/// `"partially completed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ItemStatus {
    /// Not yet started
    #[default]
    #[serde(rename = "pending")]
    Pending,

    /// Released to production
    #[serde(rename = "in_production")]
    InProduction,

    /// Some produced quantity transferred
    #[serde(rename = "partially completed")]
    PartiallyCompleted,

    /// Fully produced
    #[serde(rename = "completed")]
    Completed,

    /// Abandoned
    #[serde(rename = "canceled")]
    Canceled,
}

impl ItemStatus {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProduction => "in_production",
            Self::PartiallyCompleted => "partially completed",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}
