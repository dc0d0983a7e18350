/// Asset catalog: where the panel's files live and which fallback rules
/// apply.
///
/// The catalog is an explicit value constructed per render request (or held
/// by the caller and rebuilt when the deployment layout changes) — never
/// ambient process state. Every scan re-reads the filesystem, so a catalog
/// observes the current directory contents on each call.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::logging::{self, LayerSource};
use crate::model::{ConfigError, FallbackPolicy};
use crate::variables::find_variable;

/// Subdirectory conventionally holding the classification GeoJSON layers.
pub const LAYER_SUBDIR: &str = "camadas_geojson";

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Directories and fallback policies for one deployment of the panel.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    /// Directory holding the raster PNGs.
    pub image_dir: PathBuf,
    /// Candidate directories for classification layers, in priority order.
    pub layer_dirs: Vec<PathBuf>,
    /// Root for the facility-layer lookup and its recursive last-resort
    /// search.
    pub root_dir: PathBuf,
    /// Fallback tiers permitted for dated raster lookups.
    pub raster_policy: FallbackPolicy,
    /// Fallback tiers permitted for dated classification-layer lookups.
    pub class_policy: FallbackPolicy,
}

impl AssetCatalog {
    /// Catalog with the conventional layout: PNGs and facility layers at
    /// `base`, classification layers under `base/camadas_geojson` with the
    /// base directory as fallback.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        AssetCatalog {
            image_dir: base.clone(),
            layer_dirs: vec![base.join(LAYER_SUBDIR), base.clone()],
            root_dir: base,
            raster_policy: FallbackPolicy::ExactOnly,
            class_policy: FallbackPolicy::MostRecentFallback,
        }
    }

    /// Builds a catalog from a loaded configuration file.
    pub fn from_config(config: &CatalogConfig) -> Self {
        let base = config.base_dir.clone();
        let image_dir = match &config.image_dir {
            Some(dir) => base.join(dir),
            None => base.clone(),
        };
        let layer_dirs = match &config.layer_dirs {
            Some(dirs) => dirs.iter().map(|d| base.join(d)).collect(),
            None => vec![base.join(LAYER_SUBDIR), base.clone()],
        };
        AssetCatalog {
            image_dir,
            layer_dirs,
            root_dir: base,
            raster_policy: config.raster_policy.unwrap_or(FallbackPolicy::ExactOnly),
            class_policy: config
                .class_policy
                .unwrap_or(FallbackPolicy::MostRecentFallback),
        }
    }

    /// Candidate layer directories that exist on disk, deduplicated by
    /// canonical path so the same directory listed twice (e.g. via a
    /// relative and an absolute spelling) is scanned once.
    pub fn existing_layer_dirs(&self) -> Vec<PathBuf> {
        let mut seen = BTreeSet::new();
        let mut dirs = Vec::new();
        for dir in &self.layer_dirs {
            if !dir.is_dir() {
                continue;
            }
            let canonical = fs::canonicalize(dir).unwrap_or_else(|_| dir.clone());
            if seen.insert(canonical) {
                dirs.push(dir.clone());
            }
        }
        dirs
    }

    /// Dates for which a daily precipitation raster exists, sorted
    /// ascending. Precipitation is the reference variable: a forecast run
    /// always produces its PNG, so its dates drive the panel's date
    /// selector. Stems that do not parse as `YYYY-MM-DD` are skipped.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        // `prec` is always registered; the registry test guards this.
        let prefix = match find_variable("prec") {
            Some(var) => var.png_prefix,
            None => return Vec::new(),
        };

        let mut dates = BTreeSet::new();
        let entries = match fs::read_dir(&self.image_dir) {
            Ok(entries) => entries,
            Err(e) => {
                logging::warn(
                    LayerSource::Catalog,
                    None,
                    &format!("image dir {} unreadable: {}", self.image_dir.display(), e),
                );
                return Vec::new();
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".png"))
            else {
                continue;
            };
            if let Ok(date) = NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
                dates.insert(date);
            }
        }
        dates.into_iter().collect()
    }

    /// Most recent available daily date, the panel's default selection.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.available_dates().into_iter().next_back()
    }
}

// ---------------------------------------------------------------------------
// Configuration file
// ---------------------------------------------------------------------------

/// TOML-backed catalog configuration.
///
/// All fields are optional except `base_dir`; unspecified fields take the
/// conventional-layout defaults. `image_dir` and `layer_dirs` are resolved
/// relative to `base_dir`.
///
/// ```toml
/// base_dir = "/srv/painel"
/// layer_dirs = ["camadas_geojson", "."]
/// raster_policy = "exact-only"
/// class_policy = "most-recent-fallback"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub base_dir: PathBuf,
    pub image_dir: Option<PathBuf>,
    pub layer_dirs: Option<Vec<PathBuf>>,
    pub raster_policy: Option<FallbackPolicy>,
    pub class_policy: Option<FallbackPolicy>,
}

impl CatalogConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<CatalogConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
