use super::domain::{BranchLocation, Coordinate, GeofenceError, GeofenceResult};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub const DEFAULT_RADIUS_METERS: f64 = 100.0;

/// Great-circle distance between two coordinates (haversine).
pub fn distance_meters(p1: Coordinate, p2: Coordinate) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lat = (p2.latitude - p1.latitude).to_radians();
    let delta_lon = (p2.longitude - p1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Boundary inclusive: a point exactly `radius_meters` away is inside.
pub fn is_within_radius(point: Coordinate, center: Coordinate, radius_meters: f64) -> bool {
    distance_meters(point, center) <= radius_meters
}

/// Radius rule for every entry point: finite and strictly positive.
pub fn is_valid_radius(radius_meters: f64) -> bool {
    radius_meters.is_finite() && radius_meters > 0.0
}

/// Evaluates a single fix against every branch assigned to an employee.
///
/// Results are never cached: branch coordinates can change between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceEvaluator {
    radius_meters: f64,
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }
}

impl GeofenceEvaluator {
    pub fn new(radius_meters: f64) -> Result<Self, GeofenceError> {
        if !is_valid_radius(radius_meters) {
            return Err(GeofenceError::InvalidRadius(radius_meters));
        }
        Ok(Self { radius_meters })
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// On-site when within radius of any branch; reports the nearest one.
    pub fn evaluate(&self, point: Coordinate, branches: &[BranchLocation]) -> GeofenceResult {
        let nearest = branches
            .iter()
            .map(|branch| (branch, distance_meters(point, branch.coordinate)))
            .min_by(|(_, left), (_, right)| left.total_cmp(right));

        match nearest {
            Some((branch, distance)) => GeofenceResult {
                within_radius: distance <= self.radius_meters,
                nearest_branch: Some(branch.clone()),
                distance_meters: distance,
            },
            None => GeofenceResult {
                within_radius: false,
                nearest_branch: None,
                distance_meters: f64::INFINITY,
            },
        }
    }
}
