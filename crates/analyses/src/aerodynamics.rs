//! Low-fidelity aerodynamics: Helmbold lift slope per surface, flat-plate skin
//! friction with a thickness form factor, and an induced-drag polar.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use uav_geometry::{Wing, WingRole};
use uav_vehicle::Vehicle;

use crate::AnalysisError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AerodynamicsSettings {
    /// Added to the total drag coefficient.
    pub drag_coefficient_increment: f64,
    pub span_efficiency: f64,
    /// Two-dimensional lift slope of the sections (1/rad).
    pub section_lift_slope: f64,
}

impl Default for AerodynamicsSettings {
    fn default() -> Self {
        Self {
            drag_coefficient_increment: 0.0,
            span_efficiency: 0.9,
            section_lift_slope: 2.0 * PI,
        }
    }
}

/// Flight state the aerodynamic model is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroConditions {
    /// Angle of attack (rad).
    pub angle_of_attack: f64,
    pub velocity: f64,
    pub mach: f64,
    pub kinematic_viscosity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDrag {
    pub tag: String,
    pub drag_coefficient: f64,
}

/// Drag coefficients referenced to the vehicle reference area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DragBreakdown {
    pub parasite: Vec<ComponentDrag>,
    pub parasite_total: f64,
    pub induced: f64,
    pub increment: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AeroResult {
    pub lift_coefficient: f64,
    pub drag: DragBreakdown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aerodynamics {
    pub settings: AerodynamicsSettings,
}

impl Aerodynamics {
    /// Helmbold lift-curve slope of one surface (1/rad).
    pub fn lift_curve_slope(&self, wing: &Wing) -> f64 {
        let ar = wing.aspect_ratio;
        let kappa = self.settings.section_lift_slope / (2.0 * PI);
        let sweep = wing.sweep_quarter_chord.cos();
        2.0 * PI * ar / (2.0 + ((ar / kappa).powi(2) / (sweep * sweep) + 4.0).sqrt())
    }

    pub fn evaluate(
        &self,
        vehicle: &Vehicle,
        conditions: &AeroConditions,
    ) -> Result<AeroResult, AnalysisError> {
        let sref = vehicle.reference_area;
        if sref <= 0.0 {
            return Err(AnalysisError::MissingReferenceArea(vehicle.tag.clone()));
        }

        let mut drag = DragBreakdown {
            increment: self.settings.drag_coefficient_increment,
            ..DragBreakdown::default()
        };
        let mut lift = 0.0;

        // main wing first so its downwash is known for the tail
        let mut main_cl = 0.0;
        let mut main_ar = 0.0;
        let mut lifting: Vec<&Wing> = vehicle.wings().filter(|w| !w.vertical).collect();
        lifting.sort_by_key(|w| w.role != WingRole::Main);

        for wing in vehicle.wings() {
            let planform = wing
                .planform()
                .ok_or_else(|| AnalysisError::UnderivedWing(wing.tag.clone()))?;
            let reynolds = conditions.velocity * planform.mean_aerodynamic_chord
                / conditions.kinematic_viscosity;
            let cf = turbulent_skin_friction(reynolds, conditions.mach);
            let tc = planform.thickness_to_chord;
            let form_factor = 1.0 + 2.0 * tc + 60.0 * tc.powi(4);
            let cd0 = cf * form_factor * planform.wetted_area / sref * wing.dynamic_pressure_ratio;
            drag.parasite.push(ComponentDrag {
                tag: wing.tag.clone(),
                drag_coefficient: cd0,
            });
            drag.parasite_total += cd0;
        }

        for wing in lifting {
            let incidence = 0.5 * (wing.twist_root + wing.twist_tip);
            let downwash = if wing.role == WingRole::HorizontalTail && main_ar > 0.0 {
                2.0 * main_cl / (PI * main_ar)
            } else {
                0.0
            };
            let local_cl =
                self.lift_curve_slope(wing) * (conditions.angle_of_attack + incidence - downwash);
            let scale = wing.reference_area / sref * wing.dynamic_pressure_ratio;
            lift += local_cl * scale;
            drag.induced += local_cl * local_cl
                / (PI * self.settings.span_efficiency * wing.aspect_ratio)
                * scale;
            if wing.role == WingRole::Main {
                main_cl = local_cl;
                main_ar = wing.aspect_ratio;
            }
        }

        drag.total = drag.parasite_total + drag.induced + drag.increment;
        Ok(AeroResult {
            lift_coefficient: lift,
            drag,
        })
    }
}

/// Turbulent flat-plate skin friction with a compressibility correction.
pub fn turbulent_skin_friction(reynolds: f64, mach: f64) -> f64 {
    let re = reynolds.max(1.0e3);
    0.455 / re.log10().powf(2.58) / (1.0 + 0.144 * mach * mach).powf(0.65)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sailplane;
    use approx::assert_relative_eq;

    fn conditions(alpha: f64) -> AeroConditions {
        AeroConditions {
            angle_of_attack: alpha,
            velocity: 12.0,
            mach: 0.035,
            kinematic_viscosity: 1.5e-5,
        }
    }

    #[test]
    fn helmbold_tends_to_lifting_line_at_high_aspect_ratio() {
        let aero = Aerodynamics::default();
        let mut wing = Wing::main_wing("w");
        wing.aspect_ratio = 1.0e4;
        assert_relative_eq!(aero.lift_curve_slope(&wing), 2.0 * PI, max_relative = 1e-3);
        wing.aspect_ratio = 6.0;
        assert!(aero.lift_curve_slope(&wing) < 2.0 * PI * 6.0 / 8.0);
    }

    #[test]
    fn lift_grows_with_alpha_and_drag_is_polar() {
        let vehicle = sailplane();
        let aero = Aerodynamics::default();
        let low = aero.evaluate(&vehicle, &conditions(0.02)).unwrap();
        let high = aero.evaluate(&vehicle, &conditions(0.08)).unwrap();
        assert!(high.lift_coefficient > low.lift_coefficient);
        assert!(high.drag.induced > low.drag.induced);
        assert_relative_eq!(high.drag.parasite_total, low.drag.parasite_total);
        assert_eq!(low.drag.parasite.len(), vehicle.wings().count());
        assert_relative_eq!(
            low.drag.total,
            low.drag.parasite_total + low.drag.induced + low.drag.increment
        );
    }

    #[test]
    fn increment_is_added_to_total() {
        let vehicle = sailplane();
        let base = Aerodynamics::default();
        let padded = Aerodynamics {
            settings: AerodynamicsSettings {
                drag_coefficient_increment: 0.01,
                ..AerodynamicsSettings::default()
            },
        };
        let a = base.evaluate(&vehicle, &conditions(0.05)).unwrap();
        let b = padded.evaluate(&vehicle, &conditions(0.05)).unwrap();
        assert_relative_eq!(b.drag.total - a.drag.total, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn skin_friction_falls_with_reynolds() {
        assert!(turbulent_skin_friction(1e5, 0.0) > turbulent_skin_friction(1e6, 0.0));
    }
}
