// src/config.rs

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Numeric policy used by canonicalization, hashing and derived metrics.
///
/// `hash_precision` is the number of decimal places kept when coordinates and
/// cell parameters enter a fingerprint. Too coarse and distinct structures
/// collide; too fine and numerically noisy duplicates stop matching.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_hash_precision")]
    pub hash_precision: u32,

    /// Fractional values closer than this to 0 or 1 wrap to 0. Must stay
    /// below half the rounding step of `hash_precision`.
    #[serde(default = "default_wrap_tolerance")]
    pub wrap_tolerance: f64,

    /// Componentwise tolerance for comparing lattice vectors.
    #[serde(default = "default_vector_tolerance")]
    pub vector_tolerance: f64,

    /// Decimal places for distances, centroids and lattice sizes.
    #[serde(default = "default_metric_precision")]
    pub metric_precision: u32,

    /// Fractional tolerance for the supercell boundary test and atom dedup.
    #[serde(default = "default_supercell_tolerance")]
    pub supercell_tolerance: f64,
}

fn default_hash_precision() -> u32 {
    3
}

fn default_wrap_tolerance() -> f64 {
    5e-4
}

fn default_vector_tolerance() -> f64 {
    1e-6
}

fn default_metric_precision() -> u32 {
    4
}

fn default_supercell_tolerance() -> f64 {
    1e-5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_precision: default_hash_precision(),
            wrap_tolerance: default_wrap_tolerance(),
            vector_tolerance: default_vector_tolerance(),
            metric_precision: default_metric_precision(),
            supercell_tolerance: default_supercell_tolerance(),
        }
    }
}

impl Config {
    /// Loads config from standard OS location (e.g., ~/.config/made/settings.json)
    pub fn load() -> (Self, String) {
        let path = Self::get_path();
        if path.exists() {
            match Self::load_from(&path) {
                Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
                Err(e) => (Self::default(), format!("Error reading config: {}", e)),
            }
        } else {
            (
                Self::default(),
                "No config found. Using defaults.".to_string(),
            )
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    fn get_path() -> PathBuf {
        if let Some(proj) = ProjectDirs::from("org", "made", "made") {
            proj.config_dir().join("settings.json")
        } else {
            PathBuf::from("settings.json")
        }
    }
}
