//! Segment-property derivation for wings defined by span-wise stations.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::GeometryError;
use crate::wing::Wing;

/// Properties of the panel between two consecutive stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelProperties {
    pub inboard: String,
    pub outboard: String,
    pub inboard_chord: f64,
    pub outboard_chord: f64,
    /// Planform area of the panel, both halves for symmetric wings (m²).
    pub area: f64,
    pub wetted_area: f64,
    pub thickness_to_chord: f64,
}

/// Wing-level quantities derived from the station list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentProperties {
    /// Root chord consistent with the reference area and span (m).
    pub chord_root: f64,
    /// Tip-to-root chord ratio of the outermost station.
    pub taper: f64,
    /// Area-weighted thickness ratio.
    pub thickness_to_chord: f64,
    pub wetted_area: f64,
    pub mean_aerodynamic_chord: f64,
    /// Span-wise location of the mean aerodynamic chord from the root (m).
    pub mac_span_location: f64,
    pub panels: Vec<PanelProperties>,
}

/// Validate the stations of `wing` and fill in chord, area and thickness data.
///
/// Stations must start at 0.0, end at 1.0 and be strictly increasing. The root
/// chord is scaled so the integrated station planform matches the reference
/// area. Any previously derived planform is discarded.
pub fn segment_properties(mut wing: Wing) -> Result<Wing, GeometryError> {
    wing.validate_inputs()?;
    validate_stations(&wing)?;

    let span = wing.projected_span();
    // Half-span length for symmetric wings, full length otherwise.
    let length = if wing.symmetric && !wing.vertical {
        span * 0.5
    } else {
        span
    };
    let halves = if wing.symmetric && !wing.vertical {
        2.0
    } else {
        1.0
    };

    let unit_area: f64 = wing
        .segments
        .windows(2)
        .map(|pair| {
            let deta = pair[1].percent_span_location - pair[0].percent_span_location;
            0.5 * (pair[0].root_chord_percent + pair[1].root_chord_percent) * deta
        })
        .sum::<f64>()
        * length
        * halves;
    let chord_root = wing.reference_area / unit_area;

    let mut panels = Vec::with_capacity(wing.segments.len() - 1);
    let mut area_total = 0.0;
    let mut wetted_total = 0.0;
    let mut tc_weighted = 0.0;
    let mut c2_integral = 0.0;
    let mut cy_integral = 0.0;
    for pair in wing.segments.windows(2) {
        let (inner, outer) = (&pair[0], &pair[1]);
        let y0 = inner.percent_span_location * length;
        let y1 = outer.percent_span_location * length;
        let dy = y1 - y0;
        let c0 = inner.root_chord_percent * chord_root;
        let c1 = outer.root_chord_percent * chord_root;
        let area = 0.5 * (c0 + c1) * dy * halves;
        let tc = 0.5 * (inner.thickness_to_chord + outer.thickness_to_chord);
        let wetted = 2.0 * (1.0 + 0.2 * tc) * area;

        c2_integral += dy * (c0 * c0 + c0 * c1 + c1 * c1) / 3.0;
        cy_integral += dy * (c0 * (2.0 * y0 + y1) + c1 * (y0 + 2.0 * y1)) / 6.0;
        area_total += area;
        wetted_total += wetted;
        tc_weighted += tc * area;

        panels.push(PanelProperties {
            inboard: inner.tag.clone(),
            outboard: outer.tag.clone(),
            inboard_chord: c0,
            outboard_chord: c1,
            area,
            wetted_area: wetted,
            thickness_to_chord: tc,
        });
    }

    let semi_area = area_total / halves;
    let taper = wing
        .segments
        .last()
        .map(|s| s.root_chord_percent / wing.segments[0].root_chord_percent)
        .unwrap_or(1.0);
    if (taper - wing.taper).abs() > 1e-6 {
        warn!(
            "wing '{}': station taper {:.3} differs from input taper {:.3}; using the stations",
            wing.tag, taper, wing.taper
        );
    }

    let props = SegmentProperties {
        chord_root,
        taper,
        thickness_to_chord: tc_weighted / area_total,
        wetted_area: wetted_total,
        mean_aerodynamic_chord: c2_integral / semi_area,
        mac_span_location: cy_integral / semi_area,
        panels,
    };
    debug!(
        "wing '{}' segments: Croot {:.4} m, Ctip {:.4} m",
        wing.tag,
        props.chord_root,
        props.chord_root * props.taper
    );

    wing.planform = None;
    wing.segment_properties = Some(props);
    Ok(wing)
}

fn validate_stations(wing: &Wing) -> Result<(), GeometryError> {
    let segments = &wing.segments;
    if segments.len() < 2 {
        return Err(GeometryError::TooFewSegments {
            wing: wing.tag.clone(),
            count: segments.len(),
        });
    }
    let first = segments[0].percent_span_location;
    let last = segments[segments.len() - 1].percent_span_location;
    if first != 0.0 || last != 1.0 {
        return Err(GeometryError::SegmentBounds {
            wing: wing.tag.clone(),
            first,
            last,
        });
    }
    for (index, pair) in segments.windows(2).enumerate() {
        if !(pair[1].percent_span_location > pair[0].percent_span_location) {
            return Err(GeometryError::SegmentOrdering {
                wing: wing.tag.clone(),
                segment: pair[1].tag.clone(),
                index: index + 1,
                previous: pair[0].percent_span_location,
                current: pair[1].percent_span_location,
            });
        }
    }
    for segment in segments {
        for (field, value) in [
            ("root chord percent", segment.root_chord_percent),
            ("thickness-to-chord", segment.thickness_to_chord),
        ] {
            if !(value > 0.0) {
                return Err(GeometryError::InvalidSegment {
                    wing: wing.tag.clone(),
                    segment: segment.tag.clone(),
                    field,
                    value,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wing::WingSegment;
    use approx::assert_relative_eq;

    fn station(tag: &str, eta: f64, chord: f64) -> WingSegment {
        WingSegment {
            root_chord_percent: chord,
            thickness_to_chord: 0.1,
            ..WingSegment::new(tag, eta)
        }
    }

    fn tapered_wing() -> Wing {
        let mut wing = Wing::main_wing("main_wing");
        wing.reference_area = 2.0;
        wing.aspect_ratio = 8.0;
        wing.taper = 0.5;
        wing.append_segment(station("root", 0.0, 1.0));
        wing.append_segment(station("tip", 1.0, 0.5));
        wing
    }

    #[test]
    fn two_station_wing_matches_trapezoid() {
        let wing = segment_properties(tapered_wing()).expect("valid stations");
        let props = wing.segment_properties().unwrap();
        // b = 4, S = b * cr * (1 + taper) / 2
        assert_relative_eq!(props.chord_root, 2.0 / (4.0 * 0.75), epsilon = 1e-12);
        let cr = props.chord_root;
        let ct = 0.5 * cr;
        let mac = 2.0 / 3.0 * (cr + ct - cr * ct / (cr + ct));
        assert_relative_eq!(props.mean_aerodynamic_chord, mac, epsilon = 1e-12);
        assert_relative_eq!(props.mac_span_location, 4.0 / 6.0 * 2.0 / 1.5, epsilon = 1e-12);
        let panel_area: f64 = props.panels.iter().map(|p| p.area).sum();
        assert_relative_eq!(panel_area, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn rejects_unordered_stations() {
        let mut wing = tapered_wing();
        wing.segments.insert(1, station("break", 1.0, 0.7));
        let err = segment_properties(wing).unwrap_err();
        assert!(matches!(err, GeometryError::SegmentOrdering { index: 2, .. }));
    }

    #[test]
    fn rejects_stations_not_spanning_unit_interval() {
        let mut wing = tapered_wing();
        wing.segments[1].percent_span_location = 0.9;
        let err = segment_properties(wing).unwrap_err();
        assert!(matches!(err, GeometryError::SegmentBounds { .. }));
    }

    #[test]
    fn rejects_single_station() {
        let mut wing = Wing::main_wing("w");
        wing.append_segment(station("root", 0.0, 1.0));
        assert!(matches!(
            segment_properties(wing),
            Err(GeometryError::TooFewSegments { count: 1, .. })
        ));
    }
}
