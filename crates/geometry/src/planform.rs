//! Planform derivation: span, chords, mean aerodynamic chord, sweep, and areas.

use log::debug;
use serde::{Deserialize, Serialize};
use uav_core::vector::Vector3;

use crate::GeometryError;
use crate::wing::Wing;

/// Planform quantities derived from a wing's raw inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planform {
    pub span: f64,
    pub chord_root: f64,
    pub chord_tip: f64,
    pub mean_aerodynamic_chord: f64,
    pub mean_geometric_chord: f64,
    pub sweep_leading_edge: f64,
    pub taper: f64,
    pub thickness_to_chord: f64,
    pub wetted_area: f64,
    pub exposed_area: f64,
    pub affected_area: f64,
    pub total_length: f64,
    /// Leading edge of the mean aerodynamic chord, relative to the wing origin.
    pub mac_location: Vector3,
    /// Quarter-chord point of the mean aerodynamic chord, relative to the wing origin.
    pub aerodynamic_center: Vector3,
}

/// Derive the planform of `wing`.
///
/// The result depends only on the raw inputs and the segment-derived data, so
/// calling it again on an unchanged wing yields an identical planform. Wings
/// with stations must have gone through [`crate::segment_properties`] first.
pub fn wing_planform(mut wing: Wing) -> Result<Wing, GeometryError> {
    wing.validate_inputs()?;
    if !wing.segments.is_empty() && wing.segment_properties.is_none() {
        return Err(GeometryError::SegmentsNotDerived {
            wing: wing.tag.clone(),
        });
    }

    let sref = wing.reference_area;
    let ar = wing.aspect_ratio;
    let span = (ar * sref).sqrt();
    let along = if wing.symmetric && !wing.vertical {
        span * 0.5
    } else {
        span
    };

    let (chord_root, taper, tc, mac, mac_y, wetted) = match &wing.segment_properties {
        Some(props) => (
            props.chord_root,
            props.taper,
            props.thickness_to_chord,
            props.mean_aerodynamic_chord,
            props.mac_span_location,
            props.wetted_area,
        ),
        None => {
            let taper = wing.taper;
            let cr = 2.0 * sref / span / (1.0 + taper);
            let ct = taper * cr;
            let mac = 2.0 / 3.0 * (cr + ct - cr * ct / (cr + ct));
            let y = along / 3.0 * (1.0 + 2.0 * taper) / (1.0 + taper);
            let wetted = 2.0 * (1.0 + 0.2 * wing.thickness_to_chord) * sref;
            (cr, taper, wing.thickness_to_chord, mac, y, wetted)
        }
    };
    let chord_tip = taper * chord_root;

    let sweep_le =
        (wing.sweep_quarter_chord.tan() + (1.0 - taper) / (ar * (1.0 + taper))).atan();
    let mac_x = mac_y * sweep_le.tan();
    let (y, z) = if wing.vertical {
        (0.0, mac_y)
    } else if wing.symmetric {
        (0.0, 0.0)
    } else {
        (mac_y, 0.0)
    };

    let planform = Planform {
        span,
        chord_root,
        chord_tip,
        mean_aerodynamic_chord: mac,
        mean_geometric_chord: sref / span,
        sweep_leading_edge: sweep_le,
        taper,
        thickness_to_chord: tc,
        wetted_area: wetted,
        exposed_area: wing.exposed_ratio * wetted,
        affected_area: wing.affected_ratio * wetted,
        total_length: sweep_le.tan() * along + chord_tip,
        mac_location: [mac_x, y, z],
        aerodynamic_center: [mac_x + 0.25 * mac, y, z],
    };
    debug!(
        "wing '{}' planform: Croot {:.4} m, Ctip {:.4} m, MAC {:.4} m",
        wing.tag, planform.chord_root, planform.chord_tip, planform.mean_aerodynamic_chord
    );

    wing.planform = Some(planform);
    Ok(wing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment_properties;
    use crate::wing::WingSegment;
    use approx::assert_relative_eq;

    fn tail() -> Wing {
        let mut wing = Wing::horizontal_tail("horizontal_stabilizer");
        wing.reference_area = 0.095;
        wing.aspect_ratio = 4.87;
        wing.thickness_to_chord = 0.027;
        wing
    }

    #[test]
    fn rectangular_planform_is_consistent() {
        let wing = wing_planform(tail()).unwrap();
        let p = wing.planform().unwrap();
        assert_relative_eq!(p.span, (4.87_f64 * 0.095).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(p.chord_root, 0.095 / p.span, epsilon = 1e-12);
        assert_relative_eq!(p.chord_tip, p.chord_root, epsilon = 1e-12);
        assert_relative_eq!(p.mean_aerodynamic_chord, p.chord_root, epsilon = 1e-12);
        assert_relative_eq!(p.span * p.span / 0.095, 4.87, epsilon = 1e-9);
        assert_relative_eq!(p.aerodynamic_center[0], 0.25 * p.chord_root, epsilon = 1e-12);
    }

    #[test]
    fn planform_derivation_is_idempotent() {
        let once = wing_planform(tail()).unwrap();
        let twice = wing_planform(once.clone()).unwrap();
        assert_eq!(once.planform(), twice.planform());
    }

    fn segmented_main_wing() -> Wing {
        let mut wing = Wing::main_wing("main_wing");
        wing.reference_area = 0.594;
        wing.aspect_ratio = 15.15;
        wing.taper = 0.35;
        wing.sweep_quarter_chord = 2.0_f64.to_radians();
        wing.thickness_to_chord = 0.11;
        for (tag, eta, chord, twist_deg, sweep_deg) in [
            ("root", 0.0, 1.0, 2.0, 0.0),
            ("break_1", 0.3, 0.9, 1.5, 1.0),
            ("break_2", 0.6, 0.75, 0.5, 3.0),
            ("break_3", 0.85, 0.55, -0.5, 8.0),
            ("tip", 1.0, 0.35, -1.5, 0.0),
        ] {
            wing.append_segment(WingSegment {
                root_chord_percent: chord,
                twist: f64::to_radians(twist_deg),
                sweep_quarter_chord: f64::to_radians(sweep_deg),
                thickness_to_chord: 0.11,
                ..WingSegment::new(tag, eta)
            });
        }
        wing
    }

    #[test]
    fn segmented_planform_derivation_is_idempotent() {
        let once = wing_planform(segment_properties(segmented_main_wing()).unwrap()).unwrap();
        let twice = wing_planform(once.clone()).unwrap();
        let (a, b) = (once.planform().unwrap(), twice.planform().unwrap());

        assert_relative_eq!(a.span, b.span, epsilon = 1e-12);
        assert_relative_eq!(a.chord_root, b.chord_root, epsilon = 1e-12);
        assert_relative_eq!(a.chord_tip, b.chord_tip, epsilon = 1e-12);
        assert_relative_eq!(a.mean_aerodynamic_chord, b.mean_aerodynamic_chord, epsilon = 1e-12);
        assert_relative_eq!(a.sweep_leading_edge, b.sweep_leading_edge, epsilon = 1e-12);
        assert_relative_eq!(a.wetted_area, b.wetted_area, epsilon = 1e-12);
        assert_relative_eq!(a.total_length, b.total_length, epsilon = 1e-12);
        for axis in 0..3 {
            assert_relative_eq!(a.mac_location[axis], b.mac_location[axis], epsilon = 1e-12);
            assert_relative_eq!(
                a.aerodynamic_center[axis],
                b.aerodynamic_center[axis],
                epsilon = 1e-12
            );
        }
        // Station chords drive the planform, not the flat-wing defaults.
        assert_relative_eq!(a.taper, 0.35, epsilon = 1e-12);
        assert!(a.mean_aerodynamic_chord < a.chord_root);
        assert_eq!(once.segments, twice.segments);
    }

    #[test]
    fn segmented_wing_requires_segment_properties_first() {
        let mut wing = tail();
        wing.append_segment(WingSegment::new("root", 0.0));
        wing.append_segment(WingSegment::new("tip", 1.0));
        assert!(matches!(
            wing_planform(wing.clone()),
            Err(GeometryError::SegmentsNotDerived { .. })
        ));
        let derived = wing_planform(segment_properties(wing).unwrap()).unwrap();
        assert!(derived.is_derived());
    }

    #[test]
    fn vertical_tail_places_mac_above_root() {
        let mut wing = Wing::vertical_tail("vertical_stabilizer");
        wing.reference_area = 0.032;
        wing.aspect_ratio = 1.458;
        wing.taper = 0.6;
        let wing = wing_planform(wing).unwrap();
        let p = wing.planform().unwrap();
        assert_eq!(p.mac_location[1], 0.0);
        assert!(p.mac_location[2] > 0.0);
    }
}
