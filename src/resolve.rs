/// Asset resolution: maps a logical (variable, date) or facility-layer
/// request to a concrete file path, tolerating inconsistent on-disk
/// naming, casing, and location across deployments.
///
/// Every lookup is a single deterministic filesystem scan. "Not found" is
/// a signaled outcome, never an error — a missing asset must degrade to an
/// empty layer on the panel, not abort the render.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use walkdir::WalkDir;

use crate::catalog::AssetCatalog;
use crate::logging::{self, LayerSource};
use crate::model::{FallbackPolicy, ResolvedAsset};
use crate::variables::find_variable;

// ---------------------------------------------------------------------------
// Raster lookup
// ---------------------------------------------------------------------------

/// Resolves the raster PNG for a variable and date.
///
/// The accumulated variant is undated: the lexicographically last file
/// matching its prefix wins (filenames embed the run date, so last means
/// newest). Dated variants expect `{prefix}{date}.png` exactly; whether a
/// missing day may fall back to an older file is governed by the catalog's
/// `raster_policy` (default: no fallback).
pub fn resolve_raster(
    catalog: &AssetCatalog,
    var_key: &str,
    date: Option<NaiveDate>,
) -> ResolvedAsset {
    let Some(var) = find_variable(var_key) else {
        logging::warn(LayerSource::Raster, Some(var_key), "unknown variable key");
        return ResolvedAsset::NotFound;
    };

    if !var.dated {
        return newest_in_dirs(&[catalog.image_dir.clone()], var.png_prefix, ".png");
    }

    let Some(date) = date else {
        return ResolvedAsset::NotFound;
    };

    resolve_dated(
        &[catalog.image_dir.clone()],
        var.png_prefix,
        ".png",
        date,
        catalog.raster_policy,
        LayerSource::Raster,
        var.key,
    )
}

// ---------------------------------------------------------------------------
// Facility layer lookup
// ---------------------------------------------------------------------------

/// Resolves a facility point layer (`{key}.geojson`, case-insensitive).
///
/// Searches the root directory and the layer directories in priority
/// order, then walks the whole root recursively as a last resort — some
/// deployments keep the facility files in ad-hoc subdirectories.
pub fn resolve_facility_layer(catalog: &AssetCatalog, layer_key: &str) -> ResolvedAsset {
    let target = format!("{}.geojson", layer_key.to_lowercase());

    let mut candidate_dirs = vec![catalog.root_dir.clone()];
    candidate_dirs.extend(catalog.existing_layer_dirs());

    for dir in &candidate_dirs {
        if let Some(path) = match_in_dir(dir, &target) {
            return ResolvedAsset::Exact(path);
        }
    }

    // Last resort: recursive walk from the root.
    for entry in WalkDir::new(&catalog.root_dir)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.eq_ignore_ascii_case(&target) {
                return ResolvedAsset::Exact(entry.into_path());
            }
        }
    }

    logging::warn(
        LayerSource::Facility,
        Some(layer_key),
        "no geojson file found in any candidate directory",
    );
    ResolvedAsset::NotFound
}

// ---------------------------------------------------------------------------
// Classification layer lookup
// ---------------------------------------------------------------------------

/// Resolves the classification GeoJSON layer for a variable and date.
///
/// Dated variants use a three-tier chain: the exact file for the requested
/// day, else the latest file whose embedded date is on or before that day,
/// else the newest dated file regardless of day. A given day's classification may
/// not have been generated yet, so the most recent valid one is
/// substituted and flagged as a fallback in the match kind. Which tiers
/// are permitted is governed by the catalog's `class_policy`.
pub fn resolve_class_layer(
    catalog: &AssetCatalog,
    var_key: &str,
    date: Option<NaiveDate>,
) -> ResolvedAsset {
    let Some(var) = find_variable(var_key) else {
        logging::warn(LayerSource::ClassLayer, Some(var_key), "unknown variable key");
        return ResolvedAsset::NotFound;
    };

    let dirs = catalog.existing_layer_dirs();

    if !var.dated {
        return newest_in_dirs(&dirs, var.class_prefix, ".geojson");
    }

    let Some(date) = date else {
        return ResolvedAsset::NotFound;
    };

    resolve_dated(
        &dirs,
        var.class_prefix,
        ".geojson",
        date,
        catalog.class_policy,
        LayerSource::ClassLayer,
        var.key,
    )
}

// ---------------------------------------------------------------------------
// Shared scan helpers
// ---------------------------------------------------------------------------

/// The tiered dated lookup: exact filename, then embedded-date fallback,
/// then newest file, with each tier gated by the policy.
fn resolve_dated(
    dirs: &[PathBuf],
    prefix: &str,
    ext: &str,
    date: NaiveDate,
    policy: FallbackPolicy,
    source: LayerSource,
    key: &str,
) -> ResolvedAsset {
    let exact_name = format!("{}{}{}", prefix, date.format("%Y-%m-%d"), ext);
    for dir in dirs {
        let candidate = dir.join(&exact_name);
        if candidate.is_file() {
            return ResolvedAsset::Exact(candidate);
        }
    }

    if policy.allows_date_fallback() {
        // Files whose stem does not parse as a date are excluded from this
        // tier, not treated as errors.
        let mut best: Option<(NaiveDate, PathBuf)> = None;
        for (file_date, path) in dated_candidates(dirs, prefix, ext) {
            if file_date > date {
                continue;
            }
            // Strictly greater, so on equal dates the higher-priority
            // directory (seen first) keeps the slot.
            if best.as_ref().is_none_or(|(d, _)| file_date > *d) {
                best = Some((file_date, path));
            }
        }
        if let Some((file_date, path)) = best {
            logging::warn(
                source,
                Some(key),
                &format!("no file for {}, substituting {}", date, file_date),
            );
            return ResolvedAsset::DateFallback(path);
        }
    }

    if policy.allows_most_recent() {
        // Restricted to files with a parsable embedded date: a variable
        // whose prefix is a prefix of another variable's (`prec_` vs
        // `prec_acum_`) must not pick up the other one's files, and those
        // never strip down to a bare date.
        let mut best: Option<(NaiveDate, PathBuf)> = None;
        for (file_date, path) in dated_candidates(dirs, prefix, ext) {
            if best.as_ref().is_none_or(|(d, _)| file_date > *d) {
                best = Some((file_date, path));
            }
        }
        if let Some((file_date, path)) = best {
            logging::warn(
                source,
                Some(key),
                &format!("no file on or before {}, substituting {}", date, file_date),
            );
            return ResolvedAsset::MostRecent(path);
        }
    }

    logging::debug(source, Some(key), "no candidate file in any directory");
    ResolvedAsset::NotFound
}

/// Lexicographically last `{prefix}*{ext}` file across the directories
/// (filenames embed dates, so last sorts newest). On equal filenames the
/// higher-priority directory wins.
fn newest_in_dirs(dirs: &[PathBuf], prefix: &str, ext: &str) -> ResolvedAsset {
    let mut best: Option<(String, PathBuf)> = None;
    for path in prefixed_files(dirs, prefix, ext) {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if best.as_ref().is_none_or(|(n, _)| name > n.as_str()) {
            best = Some((name.to_string(), path));
        }
    }
    match best {
        Some((_, path)) => ResolvedAsset::MostRecent(path),
        None => ResolvedAsset::NotFound,
    }
}

/// All `{prefix}*{ext}` files across the directories, in directory
/// priority order.
fn prefixed_files(dirs: &[PathBuf], prefix: &str, ext: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else { continue };
        let mut in_dir = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(prefix) && name.ends_with(ext) && entry.path().is_file() {
                in_dir.push(entry.path());
            }
        }
        // read_dir order is platform-dependent; keep scans deterministic.
        in_dir.sort();
        files.extend(in_dir);
    }
    files
}

/// `{prefix}*{ext}` files whose stem parses as `YYYY-MM-DD`, paired with
/// that date, in directory priority order.
fn dated_candidates(dirs: &[PathBuf], prefix: &str, ext: &str) -> Vec<(NaiveDate, PathBuf)> {
    prefixed_files(dirs, prefix, ext)
        .into_iter()
        .filter_map(|path| {
            let date = embedded_date(&path, prefix, ext)?;
            Some((date, path))
        })
        .collect()
}

/// Extracts the `YYYY-MM-DD` embedded between the prefix and extension of
/// a filename, if present and parsable.
fn embedded_date(path: &Path, prefix: &str, ext: &str) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_prefix(prefix)?.strip_suffix(ext)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

/// Case-insensitive filename match within a single directory.
fn match_in_dir(dir: &Path, target_lower: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.eq_ignore_ascii_case(target_lower))
                && e.path().is_file()
        })
        .map(|e| e.path())
        .collect();
    matches.sort();
    matches.into_iter().next()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_embedded_date_parses_and_rejects() {
        let good = PathBuf::from("prec_2025-11-05.geojson");
        assert_eq!(
            embedded_date(&good, "prec_", ".geojson"),
            Some(date("2025-11-05"))
        );
        let bad = PathBuf::from("prec_final.geojson");
        assert_eq!(embedded_date(&bad, "prec_", ".geojson"), None);
        let wrong_prefix = PathBuf::from("tmin_2025-11-05.geojson");
        assert_eq!(embedded_date(&wrong_prefix, "prec_", ".geojson"), None);
    }

    #[test]
    fn test_dated_raster_exact_hit() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ecmwf_prec_2025-11-10.png");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_raster(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(
            resolved,
            ResolvedAsset::Exact(tmp.path().join("ecmwf_prec_2025-11-10.png"))
        );
    }

    #[test]
    fn test_dated_raster_has_no_fallback_by_default() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ecmwf_prec_2025-11-09.png");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_raster(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(resolved, ResolvedAsset::NotFound);
    }

    #[test]
    fn test_dated_raster_fallback_when_policy_allows() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ecmwf_prec_2025-11-09.png");
        let mut catalog = AssetCatalog::new(tmp.path());
        catalog.raster_policy = FallbackPolicy::MostRecentFallback;

        let resolved = resolve_raster(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(
            resolved,
            ResolvedAsset::DateFallback(tmp.path().join("ecmwf_prec_2025-11-09.png"))
        );
    }

    #[test]
    fn test_accumulated_raster_picks_newest() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ecmwf_prec_acumulada_2025-11-08.png");
        touch(tmp.path(), "ecmwf_prec_acumulada_2025-11-12.png");
        // Daily files share the shorter prefix but must not shadow the
        // accumulated ones.
        touch(tmp.path(), "ecmwf_prec_2025-11-20.png");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_raster(&catalog, "prec_acum", None);
        assert_eq!(
            resolved,
            ResolvedAsset::MostRecent(tmp.path().join("ecmwf_prec_acumulada_2025-11-12.png"))
        );
    }

    #[test]
    fn test_unknown_variable_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let catalog = AssetCatalog::new(tmp.path());
        assert_eq!(
            resolve_raster(&catalog, "vento", Some(date("2025-11-10"))),
            ResolvedAsset::NotFound
        );
        assert_eq!(
            resolve_class_layer(&catalog, "vento", Some(date("2025-11-10"))),
            ResolvedAsset::NotFound
        );
    }

    #[test]
    fn test_dated_raster_without_date_is_not_found() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ecmwf_prec_2025-11-10.png");
        let catalog = AssetCatalog::new(tmp.path());
        assert_eq!(resolve_raster(&catalog, "prec", None), ResolvedAsset::NotFound);
    }

    #[test]
    fn test_facility_layer_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ubs.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_facility_layer(&catalog, "UBS");
        assert_eq!(resolved, ResolvedAsset::Exact(tmp.path().join("ubs.geojson")));
    }

    #[test]
    fn test_facility_layer_recursive_last_resort() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("dados").join("unidades");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "UPA.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_facility_layer(&catalog, "upa");
        assert_eq!(resolved, ResolvedAsset::Exact(nested.join("UPA.geojson")));
    }

    #[test]
    fn test_facility_layer_not_found_is_signaled() {
        let tmp = TempDir::new().unwrap();
        let catalog = AssetCatalog::new(tmp.path());
        assert_eq!(resolve_facility_layer(&catalog, "ubsi"), ResolvedAsset::NotFound);
    }

    #[test]
    fn test_class_layer_exact_beats_fallbacks() {
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_2025-11-10.geojson");
        touch(&layers, "prec_2025-11-12.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(
            resolved,
            ResolvedAsset::Exact(layers.join("prec_2025-11-10.geojson"))
        );
    }

    #[test]
    fn test_class_layer_date_fallback_prefers_latest_on_or_before() {
        // 2025-11-10 absent, 2025-11-05 and 2025-11-12 exist — the 11-05
        // file wins, not the newer 11-12 one.
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_2025-11-05.geojson");
        touch(&layers, "prec_2025-11-12.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(
            resolved,
            ResolvedAsset::DateFallback(layers.join("prec_2025-11-05.geojson"))
        );
    }

    #[test]
    fn test_class_layer_most_recent_when_all_dates_after_request() {
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_2025-11-12.geojson");
        touch(&layers, "prec_2025-11-14.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec", Some(date("2025-11-01")));
        assert_eq!(
            resolved,
            ResolvedAsset::MostRecent(layers.join("prec_2025-11-14.geojson"))
        );
    }

    #[test]
    fn test_class_layer_most_recent_never_crosses_into_accumulated_files() {
        // `prec_` is a prefix of `prec_acum_`, and "acum…" sorts after
        // any digit — the most-recent tier must still pick the daily
        // file, not the accumulated variant's.
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_2025-11-12.geojson");
        touch(&layers, "prec_acum_2025-10-01.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec", Some(date("2025-11-01")));
        assert_eq!(
            resolved,
            ResolvedAsset::MostRecent(layers.join("prec_2025-11-12.geojson"))
        );
    }

    #[test]
    fn test_raster_fallback_never_crosses_into_accumulated_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "ecmwf_prec_2025-11-09.png");
        touch(tmp.path(), "ecmwf_prec_acumulada_2025-12-01.png");
        let mut catalog = AssetCatalog::new(tmp.path());
        catalog.raster_policy = FallbackPolicy::MostRecentFallback;

        // 2025-11-01 predates the daily file, so only the most-recent
        // tier can answer — and it must ignore the accumulated PNG.
        let resolved = resolve_raster(&catalog, "prec", Some(date("2025-11-01")));
        assert_eq!(
            resolved,
            ResolvedAsset::MostRecent(tmp.path().join("ecmwf_prec_2025-11-09.png"))
        );
    }

    #[test]
    fn test_class_layer_unparsable_dates_excluded_from_date_tier() {
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_rascunho.geojson"); // no embedded date
        touch(&layers, "prec_2025-11-05.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(
            resolved,
            ResolvedAsset::DateFallback(layers.join("prec_2025-11-05.geojson"))
        );
    }

    #[test]
    fn test_class_layer_root_fallback_dir_is_searched() {
        // No camadas_geojson directory at all; the base dir still serves
        // layer files.
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "prec_2025-11-10.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec", Some(date("2025-11-10")));
        assert_eq!(
            resolved,
            ResolvedAsset::Exact(tmp.path().join("prec_2025-11-10.geojson"))
        );
    }

    #[test]
    fn test_accumulated_class_layer_newest_across_dirs() {
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_acum_2025-11-08.geojson");
        touch(tmp.path(), "prec_acum_2025-11-12.geojson");
        let catalog = AssetCatalog::new(tmp.path());

        let resolved = resolve_class_layer(&catalog, "prec_acum", None);
        assert_eq!(
            resolved,
            ResolvedAsset::MostRecent(tmp.path().join("prec_acum_2025-11-12.geojson"))
        );
    }

    #[test]
    fn test_class_layer_empty_everywhere_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let catalog = AssetCatalog::new(tmp.path());
        assert_eq!(
            resolve_class_layer(&catalog, "tmin", Some(date("2025-11-10"))),
            ResolvedAsset::NotFound
        );
        assert_eq!(resolve_class_layer(&catalog, "prec_acum", None), ResolvedAsset::NotFound);
    }

    #[test]
    fn test_exact_only_class_policy_disables_fallbacks() {
        let tmp = TempDir::new().unwrap();
        let layers = tmp.path().join("camadas_geojson");
        fs::create_dir(&layers).unwrap();
        touch(&layers, "prec_2025-11-05.geojson");
        let mut catalog = AssetCatalog::new(tmp.path());
        catalog.class_policy = FallbackPolicy::ExactOnly;

        assert_eq!(
            resolve_class_layer(&catalog, "prec", Some(date("2025-11-10"))),
            ResolvedAsset::NotFound
        );
    }
}
