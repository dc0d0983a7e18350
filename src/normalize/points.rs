/// Health-facility point layer normalization.
///
/// Converts a facility GeoJSON file (UPA/UBS/UBSI) into flat
/// `PointRecord`s. Point features yield one record; MultiPoint features
/// expand into one record per coordinate pair, all sharing the same
/// property-derived fields. Everything else is ignored.

use std::path::Path;

use serde_json::Value;

use crate::model::{LayerDiagnostic, PointRecord};
use crate::normalize::{first_string, geometry_type, lon_lat_pair, read_features};

// ---------------------------------------------------------------------------
// Schema-alias tables
// ---------------------------------------------------------------------------
// The upstream exports use inconsistent casing for the same logical field.
// Each table is tried first-match-wins; no alias present means empty
// string, never an error.

const NAME_KEYS: &[&str] = &[
    "nm_fantasia",
    "NM_FANTASIA",
    "nome_da_es",
    "NOME_DA_ES",
    "nome",
    "NOME",
];
const FACILITY_ID_KEYS: &[&str] = &["cd_cnes", "CD_CNES", "cnes", "CNES"];
const MUNICIPALITY_KEYS: &[&str] = &["cd_mun", "CD_MUN", "cod_mun", "COD_MUN"];
const DISTRICT_KEYS: &[&str] = &["dsei", "DSEI"];
const BASE_STATION_NAME_KEYS: &[&str] = &["polo_base", "POLO_BASE"];
const BASE_STATION_CODE_KEYS: &[&str] = &["cod_polo", "COD_POLO"];

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A normalized facility point layer plus anything worth telling the
/// caller about how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct PointLayer {
    pub records: Vec<PointRecord>,
    pub diagnostics: Vec<LayerDiagnostic>,
}

impl PointLayer {
    fn empty(diagnostic: LayerDiagnostic) -> Self {
        PointLayer {
            records: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }
}

/// Parses a facility GeoJSON file into point records.
///
/// Unreadable files and malformed JSON yield an empty record list with a
/// diagnostic. Features with unparsable or out-of-range coordinates are
/// dropped silently and tallied in a `FeaturesDropped` diagnostic.
/// Parsing is idempotent and preserves source feature order.
pub fn parse_points(path: &Path, layer_name: &str) -> PointLayer {
    let features = match read_features(path) {
        Ok(features) => features,
        Err(diagnostic) => return PointLayer::empty(diagnostic),
    };

    let layer_upper = layer_name.to_uppercase();
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for feature in &features {
        let props = feature.get("properties").cloned().unwrap_or(Value::Null);
        let fields = PropertyFields::extract(&props);

        match geometry_type(feature).as_str() {
            "point" => {
                let coords = feature.get("geometry").and_then(|g| g.get("coordinates"));
                match coords.and_then(lon_lat_pair) {
                    Some((lon, lat)) => {
                        records.push(fields.record(&layer_upper, lat, lon));
                    }
                    None => dropped += 1,
                }
            }
            "multipoint" => {
                let pairs = feature
                    .get("geometry")
                    .and_then(|g| g.get("coordinates"))
                    .and_then(Value::as_array);
                let Some(pairs) = pairs else {
                    dropped += 1;
                    continue;
                };
                for pair in pairs {
                    match lon_lat_pair(pair) {
                        Some((lon, lat)) => {
                            records.push(fields.record(&layer_upper, lat, lon));
                        }
                        None => dropped += 1,
                    }
                }
            }
            // Polygons and anything else do not belong in a facility layer.
            _ => {}
        }
    }

    let mut diagnostics = Vec::new();
    if dropped > 0 {
        diagnostics.push(LayerDiagnostic::FeaturesDropped {
            path: path.to_path_buf(),
            kept: records.len(),
            dropped,
        });
    }

    PointLayer { records, diagnostics }
}

/// Property fields shared by every record a feature expands into.
struct PropertyFields {
    label: String,
    facility_id: String,
    municipality_code: String,
    district_name: String,
    base_station_name: String,
    base_station_code: String,
}

impl PropertyFields {
    fn extract(props: &Value) -> Self {
        PropertyFields {
            label: first_string(props, NAME_KEYS),
            facility_id: first_string(props, FACILITY_ID_KEYS),
            municipality_code: first_string(props, MUNICIPALITY_KEYS),
            district_name: first_string(props, DISTRICT_KEYS),
            base_station_name: first_string(props, BASE_STATION_NAME_KEYS),
            base_station_code: first_string(props, BASE_STATION_CODE_KEYS),
        }
    }

    fn record(&self, layer_name: &str, latitude: f64, longitude: f64) -> PointRecord {
        PointRecord {
            layer_name: layer_name.to_string(),
            label: self.label.clone(),
            facility_id: self.facility_id.clone(),
            municipality_code: self.municipality_code.clone(),
            district_name: self.district_name.clone(),
            base_station_name: self.base_station_name.clone(),
            base_station_code: self.base_station_code.clone(),
            latitude,
            longitude,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
