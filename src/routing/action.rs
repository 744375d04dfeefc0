//! Canonical bridge actions and the legacy route list.

use std::fmt;

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// The logical operation a request performs, independent of which legacy
/// path spelling it arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    IngestDeviceData,
    IngestCarelinkUpload,
    DatasetDataCreate,
    DatasetDataDelete,
    DatasetDelete,
    DatasetUpdate,
    UserDataDelete,
    UserDatasetsCreate,
    UserDatasetsUpdate,
    UserDatasetsDelete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::IngestDeviceData => "ingest-device-data",
            Action::IngestCarelinkUpload => "ingest-carelink-upload",
            Action::DatasetDataCreate => "dataset-data-create",
            Action::DatasetDataDelete => "dataset-data-delete",
            Action::DatasetDelete => "dataset-delete",
            Action::DatasetUpdate => "dataset-update",
            Action::UserDataDelete => "user-data-delete",
            Action::UserDatasetsCreate => "user-datasets-create",
            Action::UserDatasetsUpdate => "user-datasets-update",
            Action::UserDatasetsDelete => "user-datasets-delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every path the gateway has ever been reachable on.
///
/// Order matters only among parameterized patterns that overlap; none of
/// these do today.
pub fn legacy_routes() -> Vec<(Method, &'static str, Action)> {
    use Action::*;

    vec![
        // device uploads
        (Method::POST, "/data/:groupId", IngestDeviceData),
        (Method::POST, "/kafka/data/:groupId", IngestDeviceData),
        (Method::POST, "/v1/device/upload/cl", IngestCarelinkUpload),
        // dataset data
        (Method::POST, "/v1/datasets/:dataSetId/data", DatasetDataCreate),
        (Method::POST, "/v1/data_sets/:dataSetId/data", DatasetDataCreate),
        (Method::POST, "/dataservices/v1/datasets/:dataSetId/data", DatasetDataCreate),
        (Method::POST, "/dataservices/v1/data_sets/:dataSetId/data", DatasetDataCreate),
        (Method::DELETE, "/v1/data_sets/:dataSetId/data", DatasetDataDelete),
        (Method::DELETE, "/dataservices/v1/data_sets/:dataSetId/data", DatasetDataDelete),
        // datasets
        (Method::DELETE, "/v1/datasets/:dataSetId", DatasetDelete),
        (Method::DELETE, "/v1/data_sets/:dataSetId", DatasetDelete),
        (Method::DELETE, "/dataservices/v1/datasets/:dataSetId", DatasetDelete),
        (Method::DELETE, "/dataservices/v1/data_sets/:dataSetId", DatasetDelete),
        (Method::PUT, "/v1/datasets/:dataSetId", DatasetUpdate),
        (Method::PUT, "/v1/data_sets/:dataSetId", DatasetUpdate),
        (Method::PUT, "/dataservices/v1/datasets/:dataSetId", DatasetUpdate),
        (Method::PUT, "/dataservices/v1/data_sets/:dataSetId", DatasetUpdate),
        // users
        (Method::DELETE, "/v1/users/:userId/data", UserDataDelete),
        (Method::DELETE, "/dataservices/v1/users/:userId/data", UserDataDelete),
        (Method::POST, "/v1/users/:userId/datasets", UserDatasetsCreate),
        (Method::POST, "/v1/users/:userId/data_sets", UserDatasetsCreate),
        (Method::POST, "/dataservices/v1/users/:userId/datasets", UserDatasetsCreate),
        (Method::POST, "/dataservices/v1/users/:userId/data_sets", UserDatasetsCreate),
        // misspelled prefix shipped to clients
        (Method::POST, "/dataservicesv1/v1/users/:userId/datasets", UserDatasetsCreate),
        (Method::PUT, "/v1/users/:userId/datasets", UserDatasetsUpdate),
        (Method::PUT, "/dataservices/v1/users/:userId/datasets", UserDatasetsUpdate),
        (Method::DELETE, "/v1/users/:userId/datasets", UserDatasetsDelete),
        (Method::DELETE, "/v1/users/:userId/data_sets", UserDatasetsDelete),
        (Method::DELETE, "/dataservices/v1/users/:userId/datasets", UserDatasetsDelete),
    ]
}
