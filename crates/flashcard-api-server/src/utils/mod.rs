pub mod error;
pub mod token_estimator;

pub use error::ApiError;
