use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced to whoever drives the directory. Upstream errors carry a
/// generic message; the store error stays in `source` for logging only.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Only admins can manage users.")]
    Forbidden,

    #[error("{0}")]
    Invalid(String),

    #[error("{message}")]
    Upstream {
        message: &'static str,

        #[source]
        source: StoreError,
    },
}

impl DirectoryError {
    pub fn upstream(message: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Upstream { message, source }
    }
}
