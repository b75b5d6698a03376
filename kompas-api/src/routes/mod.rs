pub(crate) mod companies;
pub(crate) mod error;

pub(crate) use error::ApiError;
