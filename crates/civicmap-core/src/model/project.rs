// ── Project ──
//
// A civic construction initiative. Field names follow the camelCase JSON
// shape used by the web front end so project files load unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::geo::{Boundary, LatLng};

// ── ProjectId ───────────────────────────────────────────────────────

/// Stable, unique project identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ProjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── ProjectStatus ───────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum ProjectStatus {
    Active,
    Planning,
    Review,
}

// ── Project ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    /// Display string, e.g. "Knaackstraße, Berlin".
    pub location: String,
    /// Marker anchor.
    pub coordinates: LatLng,
    #[serde(default)]
    pub boundary: Boundary,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub site_plan_url: Option<String>,
    /// Completion percentage, 0-100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Project {
    /// Minimal project with no boundary and no display metadata.
    pub fn new(
        id: impl Into<ProjectId>,
        title: impl Into<String>,
        status: ProjectStatus,
        coordinates: LatLng,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status,
            location: String::new(),
            coordinates,
            boundary: Boundary::default(),
            image_url: None,
            site_plan_url: None,
            progress: 0,
            kind: None,
        }
    }

    pub fn with_boundary(mut self, boundary: impl Into<Boundary>) -> Self {
        self.boundary = boundary.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}
