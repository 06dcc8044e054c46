use crate::core::CoreEngine;
use crate::export::DEFAULT_EXPORT_BUFFER;
use crate::params::MAX_NOTE_BYTES;
use std::sync::Arc;

/// Tunables that bound per-request resource use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Encoded match records buffered ahead of a slow client.
    pub export_buffer: usize,
    /// Raw notice bytes read before the size check rejects the body.
    pub note_read_limit: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            export_buffer: DEFAULT_EXPORT_BUFFER,
            // One byte of slack for the trailing newline that gets stripped,
            // one more so an oversized body is seen as oversized.
            note_read_limit: MAX_NOTE_BYTES + 2,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<dyn CoreEngine>,
    pub limits: Limits,
}

impl AppState {
    pub fn new(core: Arc<dyn CoreEngine>) -> Self {
        Self {
            core,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
