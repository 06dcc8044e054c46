//! Best-effort aggregation of independent sub-queries
//!
//! Read endpoints that stitch several engine queries into one response must
//! not fail as a whole because one of them did. Each failure becomes a line
//! in the response's `errors` list and its field keeps the zero value.

use std::fmt::Display;

#[derive(Debug, Default)]
pub struct PartialResults {
    errors: Vec<String>,
}

impl PartialResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the value of a sub-query, or record why `what` could not be
    /// obtained and fall back to the default.
    pub fn take<T: Default, E: Display>(&mut self, what: &str, result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "unable to get {what}");
                self.errors.push(format!("unable to get {what}: {err}"));
                T::default()
            }
        }
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}
