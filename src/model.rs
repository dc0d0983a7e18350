/// Core data types for the forecast-panel asset backend.
///
/// This module defines the shared domain model imported by all other modules.
/// It contains no I/O and no filesystem logic — only types and their
/// formatting impls.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Resolution outcomes
// ---------------------------------------------------------------------------

/// How a resolved path was matched against the requested key/date.
///
/// `NotFound` is a signaled outcome, never an error: the caller renders it
/// as an empty layer with a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The exact expected filename existed.
    Exact,
    /// No exact file; the latest file with embedded date ≤ requested date
    /// was substituted.
    DateFallback,
    /// The single newest matching file was substituted regardless of date
    /// (also the normal outcome for accumulated, undated variants).
    MostRecent,
    /// No candidate file exists anywhere.
    NotFound,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::DateFallback => write!(f, "date-fallback"),
            MatchKind::MostRecent => write!(f, "most-recent"),
            MatchKind::NotFound => write!(f, "not-found"),
        }
    }
}

/// Result of one asset lookup. Every variant except `NotFound` referenced
/// an existing file at lookup time; there is no guarantee across time,
/// since a later call re-reads the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    Exact(PathBuf),
    DateFallback(PathBuf),
    MostRecent(PathBuf),
    NotFound,
}

impl ResolvedAsset {
    /// The resolved path, if any file was found.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedAsset::Exact(p)
            | ResolvedAsset::DateFallback(p)
            | ResolvedAsset::MostRecent(p) => Some(p),
            ResolvedAsset::NotFound => None,
        }
    }

    pub fn match_kind(&self) -> MatchKind {
        match self {
            ResolvedAsset::Exact(_) => MatchKind::Exact,
            ResolvedAsset::DateFallback(_) => MatchKind::DateFallback,
            ResolvedAsset::MostRecent(_) => MatchKind::MostRecent,
            ResolvedAsset::NotFound => MatchKind::NotFound,
        }
    }

    pub fn is_found(&self) -> bool {
        !matches!(self, ResolvedAsset::NotFound)
    }

    /// True when a file was found but not by exact filename match, i.e.
    /// the caller should flag the layer as substituted data.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            ResolvedAsset::DateFallback(_) | ResolvedAsset::MostRecent(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Fallback policy
// ---------------------------------------------------------------------------

/// Which tiers of the dated-lookup chain are permitted when the exact file
/// is absent.
///
/// Deployed revisions of the panel disagreed on whether dated rasters
/// should fall back to the most recent file, so this is configuration
/// rather than hardcoded behavior. Defaults: rasters use `ExactOnly`,
/// classification layers use `MostRecentFallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Only the exact expected filename is accepted.
    ExactOnly,
    /// Exact, then the latest file whose embedded date ≤ the requested date.
    DateFallback,
    /// Exact, then date fallback, then the single newest file regardless
    /// of date.
    MostRecentFallback,
}

impl FallbackPolicy {
    pub fn allows_date_fallback(&self) -> bool {
        !matches!(self, FallbackPolicy::ExactOnly)
    }

    pub fn allows_most_recent(&self) -> bool {
        matches!(self, FallbackPolicy::MostRecentFallback)
    }
}

// ---------------------------------------------------------------------------
// Normalized records
// ---------------------------------------------------------------------------

/// One health-facility location, flattened from a GeoJSON Point feature
/// (or one element of a MultiPoint).
///
/// Coordinate invariant: latitude ∈ [-90, 90], longitude ∈ [-180, 180],
/// both finite. Features violating this are dropped during normalization,
/// so a `PointRecord` always holds renderable coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    /// Upper-cased facility layer key ("UPA", "UBS", "UBSI").
    pub layer_name: String,
    /// Facility display name (`nm_fantasia` / `nome_da_es` / `nome`).
    pub label: String,
    /// CNES national facility registry code.
    pub facility_id: String,
    /// IBGE municipality code.
    pub municipality_code: String,
    /// DSEI indigenous health district name.
    pub district_name: String,
    /// Base station (polo base) name.
    pub base_station_name: String,
    /// Base station code.
    pub base_station_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One classification band from a forecast classification layer
/// (e.g. a rainfall intensity class), flattened from a Polygon or
/// MultiPolygon feature.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonClassRecord {
    pub label: String,
    /// CSS hex color for the band.
    pub color_hex: String,
    /// Paint/legend stacking position, ascending. Sorting on this field is
    /// stable, so equal-order features keep their source order.
    pub order: i64,
    /// Polygon rings as (longitude, latitude) pairs. MultiPolygon features
    /// contribute all of their rings to the same record.
    pub rings: Vec<Vec<(f64, f64)>>,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A non-fatal problem observed while resolving or parsing a layer,
/// surfaced to the caller as data rather than printed. The display text is
/// what the panel shows next to the affected layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerDiagnostic {
    /// No file matched the request.
    AssetMissing { layer: String },
    /// The file existed but was unreadable or not valid JSON.
    MalformedJson { path: PathBuf, detail: String },
    /// Valid JSON, but not a FeatureCollection with a `features` array.
    NotFeatureCollection { path: PathBuf },
    /// Some features were skipped for bad geometry or coordinates.
    FeaturesDropped { path: PathBuf, kept: usize, dropped: usize },
}

impl fmt::Display for LayerDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerDiagnostic::AssetMissing { layer } => {
                write!(f, "{}: arquivo não encontrado", layer)
            }
            LayerDiagnostic::MalformedJson { path, detail } => {
                write!(f, "{}: JSON inválido ({})", path.display(), detail)
            }
            LayerDiagnostic::NotFeatureCollection { path } => {
                write!(f, "{}: não é uma FeatureCollection", path.display())
            }
            LayerDiagnostic::FeaturesDropped { path, kept, dropped } => {
                write!(
                    f,
                    "{}: {} feição(ões) descartada(s), {} mantida(s)",
                    path.display(),
                    dropped,
                    kept
                )
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors loading the catalog configuration file. This is the only fallible
/// constructor in the crate; resolution and parsing degrade to `NotFound`
/// or empty record sets instead of erroring.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration file is not valid TOML for `CatalogConfig`.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_asset_accessors() {
        let hit = ResolvedAsset::Exact(PathBuf::from("ecmwf_prec_2025-11-10.png"));
        assert_eq!(hit.match_kind(), MatchKind::Exact);
        assert!(hit.is_found());
        assert!(!hit.is_fallback());
        assert_eq!(
            hit.path().unwrap().file_name().unwrap(),
            "ecmwf_prec_2025-11-10.png"
        );

        let miss = ResolvedAsset::NotFound;
        assert_eq!(miss.match_kind(), MatchKind::NotFound);
        assert!(miss.path().is_none());
        assert!(!miss.is_fallback());
    }

    #[test]
    fn test_fallback_variants_are_flagged() {
        let date = ResolvedAsset::DateFallback(PathBuf::from("prec_2025-11-05.geojson"));
        let recent = ResolvedAsset::MostRecent(PathBuf::from("prec_2025-11-12.geojson"));
        assert!(date.is_fallback());
        assert!(recent.is_fallback());
    }

    #[test]
    fn test_policy_tier_gates() {
        assert!(!FallbackPolicy::ExactOnly.allows_date_fallback());
        assert!(!FallbackPolicy::ExactOnly.allows_most_recent());
        assert!(FallbackPolicy::DateFallback.allows_date_fallback());
        assert!(!FallbackPolicy::DateFallback.allows_most_recent());
        assert!(FallbackPolicy::MostRecentFallback.allows_date_fallback());
        assert!(FallbackPolicy::MostRecentFallback.allows_most_recent());
    }

    #[test]
    fn test_missing_asset_message_is_renderable() {
        let d = LayerDiagnostic::AssetMissing {
            layer: "Camada previsão".to_string(),
        };
        assert_eq!(d.to_string(), "Camada previsão: arquivo não encontrado");
    }
}
