use std::io;

use thiserror::Error;

use crate::data::registry::DatasetId;

/// Failures that stop a dataset from loading.
///
/// Both variants are fatal for the dataset they name and nothing else: the
/// session state turns them into a status message and an empty dashboard.
/// An empty filter result is not an error and has no variant here.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The source file is missing or could not be read.
    #[error("{dataset}: data unavailable at {location}")]
    DataUnavailable {
        dataset: DatasetId,
        location: String,
        #[source]
        source: io::Error,
    },

    /// Required columns are absent after header normalisation.
    #[error("{dataset}: missing required column(s): {}", .missing.join(", "))]
    SchemaMismatch {
        dataset: DatasetId,
        missing: Vec<String>,
    },
}

impl DashboardError {
    /// The dataset whose load failed.
    pub fn dataset(&self) -> DatasetId {
        match self {
            DashboardError::DataUnavailable { dataset, .. }
            | DashboardError::SchemaMismatch { dataset, .. } => *dataset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_mismatch_lists_columns() {
        let err = DashboardError::SchemaMismatch {
            dataset: DatasetId::EvSales,
            missing: vec!["region".into(), "value".into()],
        };
        assert_eq!(
            err.to_string(),
            "Global EV Data Explorer: missing required column(s): region, value"
        );
        assert_eq!(err.dataset(), DatasetId::EvSales);
    }

    #[test]
    fn data_unavailable_keeps_io_source() {
        let err = DashboardError::DataUnavailable {
            dataset: DatasetId::VideoGameSales,
            location: "data/vgsales.csv".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("data/vgsales.csv"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("no such file"));
    }
}
