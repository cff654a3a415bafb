//! Lifting-surface geometry: wings, span-wise segments, and the two derivation
//! steps (segment properties, then planform) that turn raw design inputs into a
//! self-consistent planform.

pub mod planform;
pub mod segments;
pub mod wing;

pub use planform::{Planform, wing_planform};
pub use segments::{PanelProperties, SegmentProperties, segment_properties};
pub use wing::{Wing, WingRole, WingSegment};

use thiserror::Error;

/// Errors raised while validating or deriving wing geometry.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("wing '{wing}': {field} must be positive (got {value})")]
    NonPositive {
        wing: String,
        field: &'static str,
        value: f64,
    },
    #[error("wing '{wing}': taper ratio must lie in (0, 1] (got {value})")]
    InvalidTaper { wing: String, value: f64 },
    #[error("wing '{wing}': at least two span stations are required (got {count})")]
    TooFewSegments { wing: String, count: usize },
    #[error("wing '{wing}': span stations must start at 0.0 and end at 1.0 (got {first} .. {last})")]
    SegmentBounds { wing: String, first: f64, last: f64 },
    #[error(
        "wing '{wing}': span station {index} ('{segment}') at {current} does not follow {previous}"
    )]
    SegmentOrdering {
        wing: String,
        segment: String,
        index: usize,
        previous: f64,
        current: f64,
    },
    #[error("wing '{wing}': segment '{segment}' has non-positive {field} ({value})")]
    InvalidSegment {
        wing: String,
        segment: String,
        field: &'static str,
        value: f64,
    },
    #[error("wing '{wing}': segment properties must be derived before the planform")]
    SegmentsNotDerived { wing: String },
}
