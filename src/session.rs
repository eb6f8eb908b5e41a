//! The session slot and the "open first" gate.

use crate::engine::EngineHive;
use crate::error::{Result, SessionError};
use tracing::{debug, warn};

/// Holds at most one open hive.
#[derive(Debug)]
pub struct SessionSlot<H: EngineHive> {
    hive: Option<H>,
}

impl<H: EngineHive> Default for SessionSlot<H> {
    fn default() -> Self {
        Self { hive: None }
    }
}

impl<H: EngineHive> SessionSlot<H> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a hive is open.
    pub fn is_open(&self) -> bool {
        self.hive.is_some()
    }

    /// Returns the open hive, or a precondition error naming `op`.
    pub fn require(&mut self, op: &'static str) -> Result<&mut H> {
        self.hive.as_mut().ok_or_else(|| {
            debug!(op, "Refusing operation: no hive open");
            SessionError::precondition(op)
        })
    }

    /// Stores a freshly opened hive. The slot must be empty.
    pub fn install(&mut self, hive: H) {
        debug_assert!(self.hive.is_none(), "installing over an open hive");
        self.hive = Some(hive);
    }

    /// Closes the open hive, if any. Returns true if one was closed.
    ///
    /// The slot is empty afterwards even if the engine reports an error
    /// while closing; such errors are only logged.
    pub fn close(&mut self) -> bool {
        match self.hive.take() {
            Some(hive) => {
                if let Err(e) = hive.close() {
                    warn!(error = %e, "Engine reported an error while closing the hive");
                }
                true
            }
            None => false,
        }
    }
}
