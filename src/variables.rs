/// Forecast variable registry.
///
/// Defines the canonical list of forecast variables the panel can display,
/// along with their display labels and on-disk filename prefixes.
/// This is the single source of truth for variable keys — all other modules
/// should reference variables from here rather than hardcoding prefixes.

// ---------------------------------------------------------------------------
// Variable metadata
// ---------------------------------------------------------------------------

/// Metadata for a single forecast variable.
pub struct ForecastVariable {
    /// Stable key used in requests and class-layer filenames.
    pub key: &'static str,
    /// Human-readable pt-BR label, shown in the panel's selector and titles.
    pub label: &'static str,
    /// Filename prefix of the raster PNGs for this variable.
    pub png_prefix: &'static str,
    /// Filename prefix of the GeoJSON classification layers.
    pub class_prefix: &'static str,
    /// Whether assets carry an embedded `YYYY-MM-DD` date. The accumulated
    /// variant is undated: its newest file always wins.
    pub dated: bool,
}

/// All forecast variables the panel supports.
///
/// Sources:
///   - Raster PNGs: ECMWF open-data post-processing (one file per day,
///     `ecmwf_<var>_YYYY-MM-DD.png`)
///   - Classification layers: `<var>_YYYY-MM-DD.geojson` under the layer
///     directory, `prec_acum_*.geojson` for the accumulated period
pub static VARIABLE_REGISTRY: &[ForecastVariable] = &[
    ForecastVariable {
        key: "prec",
        label: "Precipitação diária (mm)",
        png_prefix: "ecmwf_prec_",
        class_prefix: "prec_",
        dated: true,
    },
    ForecastVariable {
        key: "tmin",
        label: "Temperatura mínima diária (°C)",
        png_prefix: "ecmwf_tmin_",
        class_prefix: "tmin_",
        dated: true,
    },
    ForecastVariable {
        key: "tmax",
        label: "Temperatura máxima diária (°C)",
        png_prefix: "ecmwf_tmax_",
        class_prefix: "tmax_",
        dated: true,
    },
    ForecastVariable {
        key: "tmed",
        label: "Temperatura média diária (°C)",
        png_prefix: "ecmwf_tmed_",
        class_prefix: "tmed_",
        dated: true,
    },
    ForecastVariable {
        key: "prec_acum",
        label: "Precipitação acumulada no período (mm)",
        png_prefix: "ecmwf_prec_acumulada_",
        class_prefix: "prec_acum_",
        dated: false,
    },
];

/// Health-facility point layer keys. Files are `{key}.geojson`, matched
/// case-insensitively against the layer directories.
pub static FACILITY_LAYERS: &[&str] = &["upa", "ubs", "ubsi"];

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Looks up a variable by key. Returns `None` if not registered.
pub fn find_variable(key: &str) -> Option<&'static ForecastVariable> {
    VARIABLE_REGISTRY.iter().find(|v| v.key == key)
}

/// Returns the keys of all registered variables as a `Vec<&str>`.
pub fn all_variable_keys() -> Vec<&'static str> {
    VARIABLE_REGISTRY.iter().map(|v| v.key).collect()
}

/// Returns the keys of variables that carry a per-day date.
pub fn dated_variable_keys() -> Vec<&'static str> {
    VARIABLE_REGISTRY
        .iter()
        .filter(|v| v.dated)
        .map(|v| v.key)
        .collect()
}

/// Checks whether a key names a known facility point layer
/// (case-insensitive, matching the on-disk lookup rule).
pub fn is_facility_layer(key: &str) -> bool {
    FACILITY_LAYERS
        .iter()
        .any(|l| l.eq_ignore_ascii_case(key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
