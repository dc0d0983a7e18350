/// Forecast classification layer normalization.
///
/// Converts a classification GeoJSON file into `PolygonClassRecord`s, one
/// per Polygon/MultiPolygon feature, sorted ascending by the `ordem` /
/// `order` property. The sort is stable, so bands sharing an order keep
/// their source order — the result is the declared legend and paint
/// stacking sequence, which must follow the domain's severity ordering
/// (e.g. rainfall intensity) rather than feature insertion order.

use std::path::Path;

use serde_json::Value;

use crate::model::{LayerDiagnostic, PolygonClassRecord};
use crate::normalize::{coord_to_f64, geometry_type, read_features};

/// Color used when a band's `hex` property is missing.
pub const DEFAULT_COLOR_HEX: &str = "#999999";

/// Property aliases for the legend position, tried first-match-wins.
const ORDER_KEYS: &[&str] = &["ordem", "order"];

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A normalized classification layer plus anything worth telling the
/// caller about how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLayer {
    pub records: Vec<PolygonClassRecord>,
    pub diagnostics: Vec<LayerDiagnostic>,
}

impl ClassLayer {
    fn empty(diagnostic: LayerDiagnostic) -> Self {
        ClassLayer {
            records: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// Parses a classification GeoJSON file into ordered class records.
///
/// Unreadable files and malformed JSON yield an empty record list with a
/// diagnostic. Non-polygon features are dropped and tallied. Output is
/// stably sorted ascending by `order`.
pub fn parse_polygon_classes(path: &Path) -> ClassLayer {
    let features = match read_features(path) {
        Ok(features) => features,
        Err(diagnostic) => return ClassLayer::empty(diagnostic),
    };

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (index, feature) in features.iter().enumerate() {
        let Some(rings) = extract_rings(feature) else {
            dropped += 1;
            continue;
        };
        let props = feature.get("properties").cloned().unwrap_or(Value::Null);

        let label = props
            .get("label")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("classe {}", index));

        let color_hex = props
            .get("hex")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_COLOR_HEX)
            .to_string();

        records.push(PolygonClassRecord {
            label,
            color_hex,
            order: parse_order(&props),
            rings,
        });
    }

    // Vec::sort_by_key is stable: equal orders keep source order.
    records.sort_by_key(|r| r.order);

    let mut diagnostics = Vec::new();
    if dropped > 0 {
        diagnostics.push(LayerDiagnostic::FeaturesDropped {
            path: path.to_path_buf(),
            kept: records.len(),
            dropped,
        });
    }

    ClassLayer { records, diagnostics }
}

/// Legend position from `ordem`/`order`: accepts integers, floats
/// (truncated), and numeric strings. Absent or unparsable means 0.
fn parse_order(props: &Value) -> i64 {
    for key in ORDER_KEYS {
        let Some(value) = props.get(*key) else { continue };
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return i;
                }
                if let Some(f) = n.as_f64() {
                    return f as i64;
                }
            }
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return i;
                }
                if let Ok(f) = s.parse::<f64>() {
                    return f as i64;
                }
            }
            _ => {}
        }
    }
    0
}

/// Flattens a Polygon's rings, or all rings of a MultiPolygon, into one
/// ring list. Returns `None` for non-polygon geometry. Coordinate pairs
/// that fail numeric parsing are skipped, not fatal.
fn extract_rings(feature: &Value) -> Option<Vec<Vec<(f64, f64)>>> {
    let coordinates = feature.get("geometry")?.get("coordinates")?;
    match geometry_type(feature).as_str() {
        "polygon" => Some(rings_of(coordinates)),
        "multipolygon" => {
            let polygons = coordinates.as_array()?;
            Some(polygons.iter().flat_map(rings_of).collect())
        }
        _ => None,
    }
}

fn rings_of(polygon: &Value) -> Vec<Vec<(f64, f64)>> {
    let Some(rings) = polygon.as_array() else {
        return Vec::new();
    };
    rings
        .iter()
        .map(|ring| {
            ring.as_array()
                .map(|pairs| pairs.iter().filter_map(pair_of).collect())
                .unwrap_or_default()
        })
        .collect()
}

fn pair_of(coords: &Value) -> Option<(f64, f64)> {
    let pair = coords.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    Some((coord_to_f64(&pair[0])?, coord_to_f64(&pair[1])?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
