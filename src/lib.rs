//! Asset resolution and GeoJSON normalization for the meteorological
//! forecast panel.
//!
//! The panel displays precomputed ECMWF raster images (daily and
//! accumulated precipitation, temperature) and overlays forecast
//! classification polygons and health-facility point layers
//! (UPA/UBS/UBSI). Deployments differ in where those files live and how
//! they are named; this crate absorbs that variance behind two leaf
//! components:
//!
//! - **resolution** (`catalog` + `resolve`): map a logical
//!   (variable, date) or facility-layer request to a concrete file path,
//!   with explicit, policy-controlled fallback when the exact file is
//!   absent. A missing asset is a signaled outcome, never an error.
//! - **normalization** (`normalize`): parse the discovered GeoJSON into
//!   flat, rendering-agnostic record sets, tolerating the upstream
//!   exports' inconsistent property casing and coordinate typing.
//!
//! Everything is synchronous, read-only against the file store, and free
//! of shared mutable state: a [`catalog::AssetCatalog`] is a plain value
//! rebuilt per request, and concurrent callers need no coordination.
//!
//! Rendering, animation, and UI wiring are the consuming layer's
//! responsibility.

pub mod catalog;
pub mod display;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod resolve;
pub mod variables;

pub use catalog::{AssetCatalog, CatalogConfig};
pub use model::{
    FallbackPolicy, LayerDiagnostic, MatchKind, PointRecord, PolygonClassRecord, ResolvedAsset,
};
pub use normalize::{parse_points, parse_polygon_classes};
pub use resolve::{resolve_class_layer, resolve_facility_layer, resolve_raster};
