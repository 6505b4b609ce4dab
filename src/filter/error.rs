use thiserror::Error;

/// Rejected list query parameters. Always surfaces as a 400.
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid fields: {0}")]
    InvalidFields(String),

    #[error("Invalid filters: {0}")]
    InvalidFilters(String),

    #[error("Invalid page size: {0}")]
    InvalidLimit(String),

    #[error("Invalid page position: {0}")]
    InvalidOffset(String),
}
