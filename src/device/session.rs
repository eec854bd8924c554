//! Scoped ownership of a namespace accessor for one run
//!
//! The session is acquired before the run starts and releases the accessor's
//! process-wide resources (the shared clipboard) when dropped, on every exit
//! path including unwinding.

use crate::device::traits::NamespaceAccessor;
use log::debug;

/// Guard that owns an accessor for the lifetime of a run
pub struct Session<A: NamespaceAccessor> {
    accessor: A,
}

impl<A: NamespaceAccessor> Session<A> {
    /// Acquire a session, starting from a clean clipboard
    pub fn acquire(accessor: A) -> Self {
        debug!("Session acquired");
        accessor.clear_clipboard();
        Self { accessor }
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }
}

impl<A: NamespaceAccessor> Drop for Session<A> {
    fn drop(&mut self) {
        self.accessor.release();
        debug!("Session released");
    }
}
