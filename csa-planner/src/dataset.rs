//! JSON dataset files.
//!
//! A dataset bundles a static timetable with its footpaths:
//!
//! ```json
//! { "changeTime": 60,
//!   "connections": [ { "departureStop": "A", "departureTime": "2024-03-15T08:00:00Z",
//!                      "arrivalStop": "B", "arrivalTime": "2024-03-15T08:30:00Z",
//!                      "tripId": "T1" } ],
//!   "footpaths": [ { "stop1": "B", "stop2": "C", "duration": 300 } ] }
//! ```
//!
//! Durations are whole seconds. Times are RFC 3339 strings or epoch seconds.

use std::path::Path;

use chrono::Duration;
use serde::Deserialize;
use tracing::{info, warn};

use crate::connections::{SourceError, StaticConnections};
use crate::distance::{FootpathTable, Isd};
use crate::domain::Connection;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DatasetFile {
    /// Default same-stop change time in seconds.
    #[serde(default)]
    change_time: Option<i64>,
    #[serde(default)]
    connections: Vec<Connection>,
    #[serde(default)]
    footpaths: Vec<Isd>,
}

/// A loaded dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub connections: StaticConnections,
    pub footpaths: FootpathTable,
}

impl Dataset {
    /// Read and parse a dataset file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.display().to_string(),
                source,
            })?;

        let dataset = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            connections = dataset.connections.len(),
            footpaths = dataset.footpaths.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse a dataset from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SourceError> {
        let file: DatasetFile = serde_json::from_str(text).map_err(|e| SourceError::Json {
            message: e.to_string(),
        })?;

        let mut footpaths = FootpathTable::new();
        if let Some(secs) = file.change_time {
            if secs < 0 {
                return Err(SourceError::InvalidDataset(format!(
                    "negative change time {secs}"
                )));
            }
            let change_time = Duration::try_seconds(secs).ok_or_else(|| {
                SourceError::InvalidDataset(format!("change time {secs} out of range"))
            })?;
            footpaths = footpaths.with_default_change_time(change_time);
        }
        for isd in file.footpaths {
            footpaths.add(isd.stop1, isd.stop2, isd.duration);
        }

        let inconsistent = file
            .connections
            .iter()
            .filter(|c| c.validate().is_err())
            .count();
        if inconsistent > 0 {
            warn!(
                count = inconsistent,
                "dataset contains connections that do not depart before they arrive"
            );
        }

        Ok(Self {
            connections: StaticConnections::new(file.connections),
            footpaths,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::StopId;

    const SAMPLE: &str = r#"{
        "changeTime": 60,
        "connections": [
            { "id": "c1", "departureStop": "A", "departureTime": "2024-03-15T08:00:00Z",
              "arrivalStop": "B", "arrivalTime": "2024-03-15T08:30:00Z", "tripId": "T1" },
            { "departureStop": "B", "departureTime": 1710492000,
              "arrivalStop": "C", "arrivalTime": 1710492600, "tripId": "T2" }
        ],
        "footpaths": [ { "stop1": "B", "stop2": "C", "duration": 300 } ]
    }"#;

    fn stop(s: &str) -> StopId {
        StopId::parse(s).unwrap()
    }

    #[test]
    fn parse_sample() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(dataset.connections.len(), 2);
        assert_eq!(
            dataset.footpaths.get(&stop("C"), &stop("B")),
            Some(Duration::minutes(5))
        );
        assert_eq!(dataset.footpaths.change_time(&stop("A")), Duration::minutes(1));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let dataset = Dataset::from_json("{}").unwrap();
        assert!(dataset.connections.is_empty());
        assert!(dataset.footpaths.is_empty());
        assert_eq!(dataset.footpaths.change_time(&stop("A")), Duration::zero());
    }

    #[test]
    fn rejects_negative_durations() {
        let err = Dataset::from_json(r#"{ "changeTime": -1 }"#).unwrap_err();
        assert!(matches!(err, SourceError::InvalidDataset(_)));

        let err = Dataset::from_json(
            r#"{ "footpaths": [ { "stop1": "A", "stop2": "B", "duration": -5 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }

    #[test]
    fn rejects_out_of_range_durations() {
        let err = Dataset::from_json(r#"{ "changeTime": 9223372036854776 }"#).unwrap_err();
        assert!(matches!(err, SourceError::InvalidDataset(_)));

        let err = Dataset::from_json(
            r#"{ "footpaths": [ { "stop1": "B", "stop2": "C", "duration": 9223372036854776 } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Dataset::from_json("{ not json"),
            Err(SourceError::Json { .. })
        ));
        assert!(matches!(
            Dataset::from_json(r#"{ "stops": [] }"#),
            Err(SourceError::Json { .. })
        ));
    }

    #[tokio::test]
    async fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = Dataset::load(file.path()).await.unwrap();
        assert_eq!(dataset.connections.len(), 2);
    }

    #[tokio::test]
    async fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::load(dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
