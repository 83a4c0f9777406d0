// ── Project seed data ──
//
// The six Berlin school projects the map ships with, plus loading of a
// project list from a JSON file in the same camelCase shape.

use std::path::Path;

use crate::error::CoreError;
use crate::model::{Boundary, LatLng, Project, ProjectStatus};

const IMAGE_BASE: &str = "https://images.unsplash.com";
const IMAGE_PARAMS: &str = "?q=80&w=1600&auto=format&fit=crop";

fn image(id: &str) -> Option<String> {
    Some(format!("{IMAGE_BASE}/{id}{IMAGE_PARAMS}"))
}

struct Seed {
    id: &'static str,
    title: &'static str,
    aim: &'static str,
    status: ProjectStatus,
    location: &'static str,
    coordinates: LatLng,
    image: &'static str,
    site_plan: &'static str,
    progress: u8,
}

impl Seed {
    fn into_project(self, boundary: Boundary) -> Project {
        Project {
            description: format!("GOVERNMENT AIM: {}", self.aim),
            location: self.location.into(),
            image_url: image(self.image),
            site_plan_url: image(self.site_plan),
            progress: self.progress,
            kind: Some("School".into()),
            ..Project::new(self.id, self.title, self.status, self.coordinates)
        }
        .with_boundary(boundary)
    }

    fn boxed(self, size: f64) -> Project {
        let boundary = Boundary::rectangle(self.coordinates, size);
        self.into_project(boundary)
    }
}

const SKETCH_PLAN: &str = "photo-1581094288338-2314dddb7ece";
const SKETCH_DRAFT: &str = "photo-1630699104033-b26a62c45308";

/// The initial project collection, in draw order.
pub fn berlin_projects() -> Vec<Project> {
    let mandela = Seed {
        id: "1",
        title: "Nelson Mandela School Extension",
        aim: "To expand the bilingual campus in Charlottenburg with a sustainable annex. \
              The goal is to create flexible learning spaces.",
        status: ProjectStatus::Active,
        location: "Pfalzburger Str., Berlin",
        coordinates: LatLng::new(52.4816, 13.3235),
        image: "photo-1562774053-701939374585",
        site_plan: SKETCH_PLAN,
        progress: 75,
    };
    // L-shaped footprint.
    let mandela = mandela.into_project(Boundary::new(vec![
        LatLng::new(52.4817, 13.3234),
        LatLng::new(52.4817, 13.3236),
        LatLng::new(52.4815, 13.3236),
        LatLng::new(52.4815, 13.3235),
        LatLng::new(52.4816, 13.3235),
        LatLng::new(52.4816, 13.3234),
    ]));

    vec![
        mandela,
        Seed {
            id: "2",
            title: "Kollwitzplatz Schoolyard",
            aim: "A complete redesign of the schoolyard. The focus is on \"Active Breaks\" - \
                  integrating climbing structures.",
            status: ProjectStatus::Planning,
            location: "Knaackstraße, Berlin",
            coordinates: LatLng::new(52.5365, 13.4170),
            image: "photo-1509062522246-3755977927d7",
            site_plan: SKETCH_DRAFT,
            progress: 30,
        }
        .boxed(0.000_15),
        Seed {
            id: "3",
            title: "Campus Rütli Hub",
            aim: "Building a new community hub in Neukölln with a public library and \
                  vocational workshops.",
            status: ProjectStatus::Review,
            location: "Rütli-Straße, Berlin",
            coordinates: LatLng::new(52.4862, 13.4385),
            image: "photo-1523050854058-8df90110c9f1",
            site_plan: SKETCH_PLAN,
            progress: 90,
        }
        .boxed(0.0002),
        Seed {
            id: "4",
            title: "JFK School Library",
            aim: "Modernizing the learning resources center in Zehlendorf.",
            status: ProjectStatus::Active,
            location: "Teltower Damm, Berlin",
            coordinates: LatLng::new(52.4288, 13.2625),
            image: "photo-1596496050844-461ac76b2979",
            site_plan: SKETCH_DRAFT,
            progress: 60,
        }
        .boxed(0.0002),
        Seed {
            id: "5",
            title: "Europaschule Solar Roof",
            aim: "Retrofitting the facade for energy efficiency and adding a rooftop solar \
                  garden.",
            status: ProjectStatus::Planning,
            location: "Schulstraße, Berlin",
            coordinates: LatLng::new(52.5180, 13.4800),
            image: "photo-1580582932707-520aed937b7b",
            site_plan: SKETCH_PLAN,
            progress: 15,
        }
        .boxed(0.000_15),
        Seed {
            id: "6",
            title: "Sophie Scholl Plaza",
            aim: "Creating a safe bike shelter and entry plaza to encourage sustainable \
                  commuting.",
            status: ProjectStatus::Active,
            location: "Pallasstraße, Berlin",
            coordinates: LatLng::new(52.4905, 13.3555),
            image: "photo-1497366216548-37526070297c",
            site_plan: SKETCH_DRAFT,
            progress: 45,
        }
        .boxed(0.0002),
    ]
}

/// Parse a JSON array of projects.
pub fn projects_from_json(raw: &str) -> Result<Vec<Project>, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Load a project list from a JSON file.
pub fn load_projects(path: &Path) -> Result<Vec<Project>, CoreError> {
    let file_error = |reason: String| CoreError::ProjectsFile {
        path: path.display().to_string(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
    projects_from_json(&raw).map_err(|e| file_error(e.to_string()))
}
