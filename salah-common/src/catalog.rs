//! Prayer catalog
//!
//! The catalog is a static JSON document listing every prayer with its
//! display name, a default audio id and the ordered step sequence the
//! player walks through:
//!
//! ```json
//! { "salahs": [
//!     { "name": "Fajr", "audio": "fajr", "rakat": 2,
//!       "sequence": [ { "name": "Niyyah", "audio": "niyyah_fajr" } ] }
//! ] }
//! ```
//!
//! A copy is compiled into this crate (`Catalog::bundled`); a different file
//! can be supplied through configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const BUNDLED_CATALOG: &str = include_str!("../data/salahs.json");

/// One step of a prayer's sequence
///
/// Steps have no identity of their own; they are addressed by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Display name ("Takbir", "Ruku", ...)
    pub name: String,
    /// Audio identifier, resolved to a file per language
    #[serde(rename = "audio")]
    pub audio_id: String,
}

/// A prayer and its ordered steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prayer {
    /// Display name, also the lookup key
    pub name: String,
    /// Default audio id for the prayer as a whole
    #[serde(rename = "audio")]
    pub audio_id: String,
    /// Short description shown once the sequence completes
    #[serde(default)]
    pub description: Option<String>,
    /// Number of rakat
    #[serde(default)]
    pub rakat: Option<u8>,
    /// Ordered steps
    #[serde(default)]
    pub sequence: Vec<Step>,
}

impl Prayer {
    /// Number of steps in the sequence
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// True when the prayer has no steps to play
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Step at `index`, if in range
    pub fn step(&self, index: usize) -> Option<&Step> {
        self.sequence.get(index)
    }
}

/// The full list of prayers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    salahs: Vec<Prayer>,
}

impl Catalog {
    /// Build a catalog from prayers, validating names and audio ids
    pub fn new(salahs: Vec<Prayer>) -> Result<Self> {
        let catalog = Self { salahs };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Catalog compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Parse a catalog document
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        debug!("Parsed catalog with {} prayers", catalog.salahs.len());
        Ok(catalog)
    }

    /// Load a catalog document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("Catalog file {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json(&content)
    }

    /// All prayers in display order
    pub fn prayers(&self) -> &[Prayer] {
        &self.salahs
    }

    /// Look up a prayer by name (ASCII case-insensitive)
    pub fn find(&self, name: &str) -> Option<&Prayer> {
        let name = name.trim();
        self.salahs.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for prayer in &self.salahs {
            if prayer.name.trim().is_empty() {
                return Err(Error::InvalidCatalog("Prayer with empty name".to_string()));
            }
            if prayer.audio_id.trim().is_empty() {
                return Err(Error::InvalidCatalog(format!(
                    "Prayer '{}' has an empty audio id",
                    prayer.name
                )));
            }
            if !seen.insert(prayer.name.to_ascii_lowercase()) {
                return Err(Error::InvalidCatalog(format!(
                    "Duplicate prayer name '{}'",
                    prayer.name
                )));
            }

            for (index, step) in prayer.sequence.iter().enumerate() {
                if step.name.trim().is_empty() || step.audio_id.trim().is_empty() {
                    return Err(Error::InvalidCatalog(format!(
                        "Prayer '{}' step {} needs both a name and an audio id",
                        prayer.name, index
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn step(name: &str, audio: &str) -> Step {
        Step {
            name: name.to_string(),
            audio_id: audio.to_string(),
        }
    }

    #[test]
    fn test_bundled_catalog_has_five_daily_prayers() {
        let catalog = Catalog::bundled().unwrap();
        let names: Vec<&str> = catalog.prayers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Fajr", "Lohar", "Asr", "Maghrib", "Isha"]);

        for prayer in catalog.prayers() {
            assert!(!prayer.is_empty(), "{} should have steps", prayer.name);
            assert!(prayer.description.is_some());
        }
        assert_eq!(catalog.find("Fajr").unwrap().rakat, Some(2));
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.find("maghrib").unwrap().name, "Maghrib");
        assert_eq!(catalog.find("  ISHA ").unwrap().name, "Isha");
        assert!(catalog.find("Tahajjud").is_none());
    }

    #[test]
    fn test_from_json_defaults_optional_fields() {
        let catalog = Catalog::from_json(r#"{"salahs":[{"name":"Fajr","audio":"fajr"}]}"#).unwrap();
        let fajr = catalog.find("fajr").unwrap();
        assert!(fajr.is_empty());
        assert_eq!(fajr.description, None);
        assert_eq!(fajr.rakat, None);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let prayer = Prayer {
            name: "Asr".to_string(),
            audio_id: "asr".to_string(),
            description: None,
            rakat: None,
            sequence: vec![step("Takbir", "takbir")],
        };
        let mut duplicate = prayer.clone();
        duplicate.name = "ASR".to_string();

        let err = Catalog::new(vec![prayer, duplicate]).unwrap_err();
        assert!(matches!(err, Error::InvalidCatalog(_)));
    }

    #[test]
    fn test_step_without_audio_rejected() {
        let json = r#"{"salahs":[{"name":"Fajr","audio":"fajr","sequence":[{"name":"Niyyah","audio":""}]}]}"#;
        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, Error::InvalidCatalog(_)));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Catalog::from_json("{ salahs: ").unwrap_err();
        assert!(matches!(err, Error::CatalogParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"salahs":[{{"name":"Witr","audio":"witr","sequence":[{{"name":"Qunut","audio":"qunut"}}]}}]}}"#
        )
        .unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        let witr = catalog.find("witr").unwrap();
        assert_eq!(witr.step(0).unwrap().audio_id, "qunut");
        assert!(witr.step(1).is_none());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
