// ── View-mode styling ──
//
// Maps (project status, view mode) to path style. The mapping itself is a
// pure function; `ViewModeController` only holds the current mode and
// broadcasts flips so the host can schedule a synchronization pass.

use std::fmt;

use serde::{Serialize, Serializer};
use tokio::sync::watch;
use tracing::debug;

use crate::model::{ProjectStatus, ViewMode};

// ── Color ───────────────────────────────────────────────────────────

/// An sRGB color, rendered as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Palette ─────────────────────────────────────────────────────────

pub mod palette {
    use super::Color;

    /// Active projects in standard mode (`#22c55e`).
    pub const ACTIVE: Color = Color::rgb(0x22, 0xc5, 0x5e);
    /// Planning / review projects in standard mode (`#0ea5e9`).
    pub const PROPOSED: Color = Color::rgb(0x0e, 0xa5, 0xe9);
    /// Every project in structural mode (`#2563eb`).
    pub const ENGINEERING: Color = Color::rgb(0x25, 0x63, 0xeb);
}

pub const STANDARD_FILL_OPACITY: f64 = 0.4;
pub const STRUCTURAL_FILL_OPACITY: f64 = 0.1;
pub const STROKE_WEIGHT: u8 = 2;

// ── Style resolution ────────────────────────────────────────────────

/// Resolved style for one project's polygon and marker dot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: Color,
    pub fill_opacity: f64,
    pub weight: u8,
}

/// Pure style mapping.
///
/// Structural mode uses one engineering color with sparse fill; standard
/// mode colors by status with area-emphasis fill.
pub fn style(status: ProjectStatus, mode: ViewMode) -> LayerStyle {
    match mode {
        ViewMode::Structural => LayerStyle {
            color: palette::ENGINEERING,
            fill_opacity: STRUCTURAL_FILL_OPACITY,
            weight: STROKE_WEIGHT,
        },
        ViewMode::Standard => LayerStyle {
            color: match status {
                ProjectStatus::Active => palette::ACTIVE,
                ProjectStatus::Planning | ProjectStatus::Review => palette::PROPOSED,
            },
            fill_opacity: STANDARD_FILL_OPACITY,
            weight: STROKE_WEIGHT,
        },
    }
}

// ── Legend ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: &'static str,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub heading: &'static str,
    pub entries: Vec<LegendEntry>,
}

/// Map legend shown for a view mode.
pub fn legend(mode: ViewMode) -> Legend {
    match mode {
        ViewMode::Standard => Legend {
            heading: "Planning Zones",
            entries: vec![
                LegendEntry {
                    label: "Active Projects",
                    color: palette::ACTIVE,
                },
                LegendEntry {
                    label: "Proposed",
                    color: palette::PROPOSED,
                },
            ],
        },
        ViewMode::Structural => Legend {
            heading: "Engineering Layer",
            entries: vec![LegendEntry {
                label: "Surveyed Area",
                color: palette::ENGINEERING,
            }],
        },
    }
}

// ── ViewModeController ──────────────────────────────────────────────

/// Holds the current view mode and notifies subscribers when it flips.
///
/// Never touches layers: a flip only marks the mode channel changed, and
/// the host answers with a full synchronization pass.
pub struct ViewModeController {
    mode: watch::Sender<ViewMode>,
}

impl ViewModeController {
    pub fn new(initial: ViewMode) -> Self {
        let (mode, _) = watch::channel(initial);
        Self { mode }
    }

    pub fn current(&self) -> ViewMode {
        *self.mode.borrow()
    }

    /// Set the mode. Returns `true` if it actually changed.
    pub fn set(&self, mode: ViewMode) -> bool {
        let changed = self.mode.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
        if changed {
            debug!(%mode, "view mode changed");
        }
        changed
    }

    /// Flip between standard and structural, returning the new mode.
    pub fn toggle(&self) -> ViewMode {
        let next = self.current().toggled();
        self.set(next);
        next
    }

    /// Style for `status` under the current mode.
    pub fn style(&self, status: ProjectStatus) -> LayerStyle {
        style(status, self.current())
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewMode> {
        self.mode.subscribe()
    }
}

impl Default for ViewModeController {
    fn default() -> Self {
        Self::new(ViewMode::default())
    }
}
