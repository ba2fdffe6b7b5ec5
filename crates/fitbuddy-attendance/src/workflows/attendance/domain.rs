use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// A captured device position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.7}, {:.7}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub String);

/// A gym branch the employee may check in at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchLocation {
    pub id: BranchId,
    pub name: String,
    pub coordinate: Coordinate,
}

/// Branch as delivered by the session store, with coordinates still in string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBranch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub lat: String,
    pub lng: String,
}

impl RawBranch {
    pub fn parse(&self) -> Result<BranchLocation, GeofenceError> {
        let latitude = parse_degrees(&self.id, &self.lat)?;
        let longitude = parse_degrees(&self.id, &self.lng)?;
        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_valid() {
            return Err(GeofenceError::OutOfRange {
                branch: self.id.clone(),
                coordinate,
            });
        }

        Ok(BranchLocation {
            id: BranchId(self.id.clone()),
            name: self.name.clone(),
            coordinate,
        })
    }
}

fn parse_degrees(branch: &str, raw: &str) -> Result<f64, GeofenceError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| GeofenceError::InvalidCoordinate {
            branch: branch.to_string(),
            value: raw.to_string(),
        })
}

/// Authenticated employee and the branches assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSession {
    pub user_id: i64,
    pub branches: Vec<RawBranch>,
}

impl EmployeeSession {
    /// Parsed branch list; entries with unusable coordinates are skipped.
    pub fn branch_locations(&self) -> Vec<BranchLocation> {
        self.branches
            .iter()
            .filter_map(|raw| match raw.parse() {
                Ok(branch) => Some(branch),
                Err(err) => {
                    warn!(branch = %raw.id, error = %err, "skipping branch with unusable coordinates");
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeofenceError {
    #[error("branch '{branch}' has a non-numeric coordinate '{value}'")]
    InvalidCoordinate { branch: String, value: String },
    #[error("branch '{branch}' coordinate {coordinate} is outside valid latitude/longitude ranges")]
    OutOfRange {
        branch: String,
        coordinate: Coordinate,
    },
    #[error("geofence radius must be a finite, positive number of meters (got {0})")]
    InvalidRadius(f64),
    #[error("coordinate {0} is outside valid latitude/longitude ranges")]
    InvalidPoint(Coordinate),
}

/// Result of one location routine: a fresh fix or the reason none was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AcquisitionOutcome {
    Success(Coordinate),
    PermissionDenied,
    ServiceDisabled,
    Unavailable(String),
    /// Unavailable, and the employee chose not to try again.
    Abandoned(String),
}

impl AcquisitionOutcome {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Success(coordinate) => Some(*coordinate),
            _ => None,
        }
    }
}

/// Membership of a single fix against a branch list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeofenceResult {
    pub within_radius: bool,
    pub nearest_branch: Option<BranchLocation>,
    /// Distance to the nearest branch; infinite when no branch was supplied.
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchType {
    In,
    Out,
}

impl PunchType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}
