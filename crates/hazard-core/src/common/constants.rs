//! Physical and numerical constants shared by the hazard kernels.
//!
//! Geometry works on a sphere of mean Earth radius; ground-motion models
//! convert between cm/s² and g with standard gravity.

pub const EARTH_RADIUS_KM: f64 = 6_371.0;
pub const STANDARD_GRAVITY: f64 = 9.806_65;
pub const MAX_EARTH_ELEVATION_KM: f64 = -8.848;
pub const DEFAULT_INVESTIGATION_TIME: f64 = 50.0;
pub const DEFAULT_SA_DAMPING: f64 = 5.0;
pub const JOYNER_BOORE_PROJECTION_THRESHOLD_KM: f64 = 40.0;
pub const DISTANCE_TOLERANCE_KM: f64 = 0.005;
pub const PMF_SUM_TOLERANCE: f64 = 1.0e-12;
pub const HAZARD_MAP_EPSILON: f64 = 1.0e-30;

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_INVESTIGATION_TIME, DEFAULT_SA_DAMPING, DISTANCE_TOLERANCE_KM, EARTH_RADIUS_KM,
        HAZARD_MAP_EPSILON, JOYNER_BOORE_PROJECTION_THRESHOLD_KM, MAX_EARTH_ELEVATION_KM,
        PMF_SUM_TOLERANCE, STANDARD_GRAVITY,
    };

    #[test]
    fn constants_remain_finite_and_positive() {
        for value in [
            EARTH_RADIUS_KM,
            STANDARD_GRAVITY,
            DEFAULT_INVESTIGATION_TIME,
            DEFAULT_SA_DAMPING,
            JOYNER_BOORE_PROJECTION_THRESHOLD_KM,
            DISTANCE_TOLERANCE_KM,
            PMF_SUM_TOLERANCE,
            HAZARD_MAP_EPSILON,
        ] {
            assert!(value.is_finite());
            assert!(value > 0.0);
        }
        assert!(MAX_EARTH_ELEVATION_KM < 0.0);
    }

    #[test]
    fn tolerances_are_small_relative_to_geometry() {
        assert!(DISTANCE_TOLERANCE_KM < 1.0);
        assert!(PMF_SUM_TOLERANCE < 1.0e-6);
    }
}
