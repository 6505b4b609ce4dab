pub mod types;
pub mod list_params;
pub mod error;

pub use types::*;
pub use list_params::ListParams;
pub use error::FilterError;
