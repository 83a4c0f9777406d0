// ── View mode ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Global rendering style switch for the map view.
///
/// Affects color and opacity mapping only, never the rendered data.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ViewMode {
    #[default]
    Standard,
    Structural,
}

impl ViewMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Standard => Self::Structural,
            Self::Structural => Self::Standard,
        }
    }
}
