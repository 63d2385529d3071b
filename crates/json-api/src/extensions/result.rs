//! Conversions from infrastructure failures into 500 responses.

use std::fmt::Display;

use salvo::prelude::StatusError;
use tracing::error;

pub(crate) trait ResultExt<T> {
    /// Logs the failure under `operation` and hides it behind a bare 500.
    fn or_500(self, operation: &'static str) -> Result<T, StatusError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn or_500(self, operation: &'static str) -> Result<T, StatusError> {
        self.map_err(|source| {
            error!(operation, error = %source, "request failed");

            StatusError::internal_server_error()
        })
    }
}
