/// GeoJSON normalization for the panel's two known source schemas:
/// health-facility point layers and forecast classification polygon
/// layers.
///
/// Upstream exports are produced independently and disagree on property
/// casing (`nm_fantasia` vs `NM_FANTASIA`) and even on coordinate typing
/// (numbers vs numeric strings). Rather than requiring upstream fixes, the
/// normalizer absorbs the variance here and emits flat, rendering-agnostic
/// records.
///
/// Submodules:
/// - `points` — facility point layers (UPA/UBS/UBSI).
/// - `classes` — classification polygon layers (value bands with color
///   and legend order).

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::model::LayerDiagnostic;

pub mod classes;
pub mod points;

pub use classes::{parse_polygon_classes, ClassLayer};
pub use points::{parse_points, PointLayer};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Reads a file and extracts its `features` array. Any failure — missing
/// file, bad JSON, or a document that is not a FeatureCollection — comes
/// back as a diagnostic, never a panic or an error.
pub(crate) fn read_features(path: &Path) -> Result<Vec<Value>, LayerDiagnostic> {
    let contents = fs::read_to_string(path).map_err(|e| LayerDiagnostic::MalformedJson {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let doc: Value =
        serde_json::from_str(&contents).map_err(|e| LayerDiagnostic::MalformedJson {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    match doc.get("features").and_then(Value::as_array) {
        Some(features) => Ok(features.clone()),
        None => Err(LayerDiagnostic::NotFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

/// Parses a coordinate component that may be a JSON number or a
/// string-typed number. Returns `None` for anything non-finite or
/// unparsable.
pub(crate) fn coord_to_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Extracts a (longitude, latitude) pair from a GeoJSON coordinate array,
/// enforcing the renderable ranges: lon ∈ [-180, 180], lat ∈ [-90, 90].
pub(crate) fn lon_lat_pair(coords: &Value) -> Option<(f64, f64)> {
    let pair = coords.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let lon = coord_to_f64(&pair[0])?;
    let lat = coord_to_f64(&pair[1])?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return None;
    }
    Some((lon, lat))
}

/// First-match-wins lookup across a schema-alias key list. Strings are
/// taken as-is; numbers are stringified, since some facility exports
/// store codes like `cd_cnes` numerically. Nulls, containers, and empty
/// strings fall through to the next alias; no alias present yields the
/// empty string.
pub(crate) fn first_string(props: &Value, keys: &[&str]) -> String {
    for key in keys {
        match props.get(*key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

/// Lower-cased, trimmed `geometry.type` of a feature, or an empty string.
pub(crate) fn geometry_type(feature: &Value) -> String {
    feature
        .get("geometry")
        .and_then(|g| g.get("type"))
        .and_then(Value::as_str)
        .map(|t| t.trim().to_lowercase())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coord_accepts_numbers_and_numeric_strings() {
        assert_eq!(coord_to_f64(&json!(-46.6)), Some(-46.6));
        assert_eq!(coord_to_f64(&json!("-46.6")), Some(-46.6));
        assert_eq!(coord_to_f64(&json!(" -23.5 ")), Some(-23.5));
        assert_eq!(coord_to_f64(&json!("sul")), None);
        assert_eq!(coord_to_f64(&json!(null)), None);
        assert_eq!(coord_to_f64(&json!([1.0])), None);
    }

    #[test]
    fn test_lon_lat_pair_enforces_ranges() {
        assert_eq!(lon_lat_pair(&json!([-46.6, -23.5])), Some((-46.6, -23.5)));
        assert_eq!(lon_lat_pair(&json!([-46.6])), None);
        assert_eq!(lon_lat_pair(&json!([-200.0, -23.5])), None);
        assert_eq!(lon_lat_pair(&json!([-46.6, 95.0])), None);
    }

    #[test]
    fn test_first_string_prefers_earlier_aliases() {
        let props = json!({ "NOME": "Upper", "nome": "lower" });
        assert_eq!(first_string(&props, &["nome", "NOME"]), "lower");
        assert_eq!(first_string(&props, &["nm_fantasia", "NOME"]), "Upper");
        assert_eq!(first_string(&props, &["cnes"]), "");
    }

    #[test]
    fn test_first_string_stringifies_numeric_values() {
        let props = json!({ "cd_cnes": 1234567, "cd_mun": 3550308 });
        assert_eq!(first_string(&props, &["cd_cnes", "CD_CNES"]), "1234567");
        assert_eq!(first_string(&props, &["cd_mun"]), "3550308");
        // Nulls and containers still fall through.
        let odd = json!({ "cnes": null, "CNES": ["7654321"] });
        assert_eq!(first_string(&odd, &["cnes", "CNES"]), "");
    }

    #[test]
    fn test_first_string_skips_empty_values() {
        let props = json!({ "nome": "", "NOME": "Posto Central" });
        assert_eq!(first_string(&props, &["nome", "NOME"]), "Posto Central");
    }

    #[test]
    fn test_geometry_type_is_normalized() {
        let feature = json!({ "geometry": { "type": " MultiPoint " } });
        assert_eq!(geometry_type(&feature), "multipoint");
        assert_eq!(geometry_type(&json!({})), "");
        assert_eq!(geometry_type(&json!({ "geometry": null })), "");
    }
}
