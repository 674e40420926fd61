//! Scene catalog consumption.
//!
//! The catalog itself — editing, reordering, persistence — belongs to the
//! UI layer. This module only defines the preset value type, the read-only
//! [`SceneSource`] face the station consumes, and a JSON-backed catalog
//! matching the `scenes.json` file the device keeps on its storage card.

use std::io::ErrorKind;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lighting::LightingState;

/// One ordered colour preset. `name` is unique and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePreset {
    pub name: String,
    pub brightness: u8,
    #[serde(rename = "r")]
    pub red: u8,
    #[serde(rename = "g")]
    pub green: u8,
    #[serde(rename = "b")]
    pub blue: u8,
    #[serde(rename = "w")]
    pub white: u8,
}

impl ScenePreset {
    /// The lighting values this preset commands.
    pub fn lighting_state(&self) -> LightingState {
        LightingState {
            brightness: self.brightness,
            red: self.red,
            green: self.green,
            blue: self.blue,
            white: self.white,
        }
    }
}

/// Read-only access to ordered presets — the station's only coupling to
/// the catalog.
pub trait SceneSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<ScenePreset>;

    fn first(&self) -> Option<ScenePreset> {
        self.get(0)
    }
}

// ───────────────────────────────────────────────────────────────
// JSON catalog
// ───────────────────────────────────────────────────────────────

/// Written to storage on first boot so the user has something to edit.
pub const DEFAULT_SCENES_JSON: &str = r#"{
  "scenes": [
    { "name": "Example Scene 1", "brightness": 100, "r": 255, "g": 200, "b": 150, "w": 0 },
    { "name": "Example Scene 2", "brightness": 75, "r": 100, "g": 150, "b": 255, "w": 50 }
  ]
}
"#;

#[derive(Debug, Serialize, Deserialize)]
struct SceneFile {
    scenes: Vec<ScenePreset>,
}

/// In-memory catalog loaded from the device's `scenes.json`.
#[derive(Debug, Default)]
pub struct SceneCatalog {
    scenes: Vec<ScenePreset>,
}

impl SceneCatalog {
    /// Parse a catalog, rejecting empty or duplicate names.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SceneFile = serde_json::from_str(json).map_err(|e| {
            warn!("scene file parse error: {e}");
            Error::Config("malformed scene file")
        })?;

        for (i, scene) in file.scenes.iter().enumerate() {
            if scene.name.trim().is_empty() {
                return Err(Error::InvalidArgument("scene name must not be empty"));
            }
            if file.scenes[..i].iter().any(|s| s.name == scene.name) {
                return Err(Error::InvalidArgument("scene names must be unique"));
            }
        }

        Ok(Self {
            scenes: file.scenes,
        })
    }

    /// Load the catalog from `path`, creating a default file if none
    /// exists. Never fails: an unreadable or malformed file yields an
    /// empty catalog (and a log entry) rather than halting startup.
    pub fn load_or_create(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(catalog) => {
                    info!("loaded {} scene(s) from {}", catalog.len(), path.display());
                    catalog
                }
                Err(e) => {
                    warn!("ignoring {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, creating default file", path.display());
                if let Err(e) = std::fs::write(path, DEFAULT_SCENES_JSON) {
                    warn!("failed to create {}: {e}", path.display());
                }
                Self::from_json(DEFAULT_SCENES_JSON).unwrap_or_default()
            }
            Err(e) => {
                warn!("failed to read {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

impl SceneSource for SceneCatalog {
    fn len(&self) -> usize {
        self.scenes.len()
    }

    fn get(&self, index: usize) -> Option<ScenePreset> {
        self.scenes.get(index).cloned()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
