//! Wing records and span-wise stations.

use serde::{Deserialize, Serialize};
use uav_core::vector::Vector3;

use crate::GeometryError;
use crate::planform::Planform;
use crate::segments::SegmentProperties;

/// Role a lifting surface plays on the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WingRole {
    Main,
    HorizontalTail,
    VerticalTail,
}

/// Span-wise station defining local geometry along a lifting surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WingSegment {
    pub tag: String,
    /// Station location as a fraction of the span, `0.0` at the root.
    pub percent_span_location: f64,
    /// Local twist (rad).
    pub twist: f64,
    /// Local chord as a fraction of the root chord.
    pub root_chord_percent: f64,
    pub thickness_to_chord: f64,
    /// Quarter-chord sweep of the panel outboard of this station (rad).
    pub sweep_quarter_chord: f64,
}

impl WingSegment {
    pub fn new(tag: impl Into<String>, percent_span_location: f64) -> Self {
        Self {
            tag: tag.into(),
            percent_span_location,
            twist: 0.0,
            root_chord_percent: 1.0,
            thickness_to_chord: 0.12,
            sweep_quarter_chord: 0.0,
        }
    }
}

/// A lifting surface. The raw design inputs are public fields; derived data is
/// only populated by [`crate::segment_properties`] and [`crate::wing_planform`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wing {
    pub tag: String,
    pub role: WingRole,
    /// Reference (planform) area (m²).
    pub reference_area: f64,
    pub aspect_ratio: f64,
    /// Quarter-chord sweep (rad).
    pub sweep_quarter_chord: f64,
    pub taper: f64,
    pub thickness_to_chord: f64,
    /// Root twist (rad).
    pub twist_root: f64,
    /// Tip twist (rad).
    pub twist_tip: f64,
    pub dynamic_pressure_ratio: f64,
    /// Exposed area as a fraction of the wetted area.
    pub exposed_ratio: f64,
    /// Area affected by control surfaces, as a fraction of the wetted area.
    pub affected_ratio: f64,
    pub number_ribs: u32,
    pub number_end_ribs: u32,
    pub symmetric: bool,
    pub vertical: bool,
    pub t_tail: bool,
    pub high_lift: bool,
    /// Root leading-edge position measured from the nose (m).
    pub origin: Vector3,
    /// Aerodynamic-center estimate relative to `origin`, superseded once the planform is derived.
    pub aerodynamic_center: Vector3,
    pub segments: Vec<WingSegment>,
    #[serde(skip)]
    pub(crate) segment_properties: Option<SegmentProperties>,
    #[serde(skip)]
    pub(crate) planform: Option<Planform>,
}

impl Wing {
    fn with_role(tag: impl Into<String>, role: WingRole) -> Self {
        Self {
            tag: tag.into(),
            role,
            reference_area: 1.0,
            aspect_ratio: 6.0,
            sweep_quarter_chord: 0.0,
            taper: 1.0,
            thickness_to_chord: 0.12,
            twist_root: 0.0,
            twist_tip: 0.0,
            dynamic_pressure_ratio: 1.0,
            exposed_ratio: 0.8,
            affected_ratio: 0.6,
            number_ribs: 0,
            number_end_ribs: 0,
            symmetric: true,
            vertical: matches!(role, WingRole::VerticalTail),
            t_tail: false,
            high_lift: false,
            origin: [0.0; 3],
            aerodynamic_center: [0.0; 3],
            segments: Vec::new(),
            segment_properties: None,
            planform: None,
        }
    }

    pub fn main_wing(tag: impl Into<String>) -> Self {
        Self::with_role(tag, WingRole::Main)
    }

    pub fn horizontal_tail(tag: impl Into<String>) -> Self {
        Self::with_role(tag, WingRole::HorizontalTail)
    }

    pub fn vertical_tail(tag: impl Into<String>) -> Self {
        Self::with_role(tag, WingRole::VerticalTail)
    }

    /// Set the aspect ratio from a projected span and the current reference area.
    pub fn set_projected_span(&mut self, span: f64) {
        self.aspect_ratio = span * span / self.reference_area;
        self.invalidate();
    }

    /// Append a span-wise station. Derived data is discarded.
    pub fn append_segment(&mut self, segment: WingSegment) {
        self.segments.push(segment);
        self.invalidate();
    }

    /// Discard derived data after raw inputs were edited.
    pub fn invalidate(&mut self) {
        self.segment_properties = None;
        self.planform = None;
    }

    /// Projected span implied by the raw inputs (m).
    pub fn projected_span(&self) -> f64 {
        (self.aspect_ratio * self.reference_area).sqrt()
    }

    pub fn segment_properties(&self) -> Option<&SegmentProperties> {
        self.segment_properties.as_ref()
    }

    pub fn planform(&self) -> Option<&Planform> {
        self.planform.as_ref()
    }

    pub fn is_derived(&self) -> bool {
        self.planform.is_some()
    }

    /// Aerodynamic center measured from the nose: the derived value when available.
    pub fn aerodynamic_center_from_nose(&self) -> Vector3 {
        let local = self
            .planform
            .as_ref()
            .map(|p| p.aerodynamic_center)
            .unwrap_or(self.aerodynamic_center);
        uav_core::vector::add(&self.origin, &local)
    }

    /// Run segment-property derivation (when segments exist) followed by planform derivation.
    pub fn derive(self) -> Result<Self, GeometryError> {
        let wing = if self.segments.is_empty() {
            self
        } else {
            crate::segment_properties(self)?
        };
        crate::wing_planform(wing)
    }

    pub(crate) fn validate_inputs(&self) -> Result<(), GeometryError> {
        let positive = [
            ("reference area", self.reference_area),
            ("aspect ratio", self.aspect_ratio),
            ("thickness-to-chord", self.thickness_to_chord),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(GeometryError::NonPositive {
                    wing: self.tag.clone(),
                    field,
                    value,
                });
            }
        }
        if !(self.taper > 0.0 && self.taper <= 1.0) {
            return Err(GeometryError::InvalidTaper {
                wing: self.tag.clone(),
                value: self.taper,
            });
        }
        Ok(())
    }
}
