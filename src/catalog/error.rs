use thiserror::Error;

use crate::predict::PredictError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("SATCAT parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Predict(#[from] PredictError),
}
