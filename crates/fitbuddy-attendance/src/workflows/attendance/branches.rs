use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::domain::{BranchLocation, GeofenceError, RawBranch};

#[derive(Debug, thiserror::Error)]
pub enum BranchImportError {
    #[error("failed to read branch roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid branch roster CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid branch on line {line}: {source}")]
    Branch {
        line: u64,
        #[source]
        source: GeofenceError,
    },
    #[error("branch roster is empty")]
    Empty,
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    #[serde(default)]
    name: String,
    lat: String,
    lng: String,
}

/// Branch list loaded from an `id,name,lat,lng` CSV export.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRoster {
    raw: Vec<RawBranch>,
    branches: Vec<BranchLocation>,
}

impl BranchRoster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BranchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Unlike the session path, a roster with an unusable row is rejected outright.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BranchImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut raw = Vec::new();
        let mut branches = Vec::new();
        for row in csv_reader.deserialize::<RosterRow>() {
            let row = row?;
            let entry = RawBranch {
                id: row.id,
                name: row.name,
                lat: row.lat,
                lng: row.lng,
            };
            let line = raw.len() as u64 + 2;
            let branch = entry
                .parse()
                .map_err(|source| BranchImportError::Branch { line, source })?;
            raw.push(entry);
            branches.push(branch);
        }

        if branches.is_empty() {
            return Err(BranchImportError::Empty);
        }
        Ok(Self { raw, branches })
    }

    pub fn branches(&self) -> &[BranchLocation] {
        &self.branches
    }

    /// String-coordinate form, as the session store hands branches over.
    pub fn into_raw(self) -> Vec<RawBranch> {
        self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn imports_roster_rows() {
        let csv = "id,name,lat,lng\n1,Salt Lake,22.5739500,88.3066500\n2, Howrah ,22.5958,88.2636\n";
        let roster = BranchRoster::from_reader(Cursor::new(csv)).expect("roster parses");

        assert_eq!(roster.branches().len(), 2);
        assert_eq!(roster.branches()[1].name, "Howrah");
        assert_eq!(roster.branches()[0].coordinate.latitude, 22.57395);
        assert_eq!(roster.into_raw()[0].lat, "22.5739500");
    }

    #[test]
    fn reports_line_of_bad_branch() {
        let csv = "id,name,lat,lng\n1,Main,22.57,88.30\n2,Broken,abc,88.30\n";
        match BranchRoster::from_reader(Cursor::new(csv)) {
            Err(BranchImportError::Branch { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected branch error, got {other:?}"),
        }
    }

    #[test]
    fn empty_roster_is_rejected() {
        let csv = "id,name,lat,lng\n";
        assert!(matches!(
            BranchRoster::from_reader(Cursor::new(csv)),
            Err(BranchImportError::Empty)
        ));
    }
}
