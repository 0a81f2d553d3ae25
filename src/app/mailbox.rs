//! Single-slot hand-over between the sampling task and the control loop.
//!
//! The sampling side (camera strobe, ADC bursts, encoder poll) builds a
//! complete [`Snapshot`] and posts it; the control loop takes it at the
//! start of its cycle.  Posting overwrites an untaken snapshot, so the
//! loop always works on the newest data and never on a half-written one.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::config::CAMERA_IMAGE_SIZE;

use super::ports::Snapshot;

/// Latest-value-wins snapshot slot, safe to share with an interrupt or a
/// second executor.
pub struct SnapshotMailbox<R, const N: usize = CAMERA_IMAGE_SIZE> {
    slot: Signal<CriticalSectionRawMutex, Snapshot<R, N>>,
}

impl<R, const N: usize> SnapshotMailbox<R, N> {
    pub const fn new() -> Self {
        Self { slot: Signal::new() }
    }

    /// Publish a snapshot, replacing one that was not taken yet.
    pub fn post(&self, snapshot: Snapshot<R, N>) {
        self.slot.signal(snapshot);
    }

    /// Take the pending snapshot, if any.
    pub fn take(&self) -> Option<Snapshot<R, N>> {
        self.slot.try_take()
    }

    /// Wait for the next snapshot.
    pub async fn wait(&self) -> Snapshot<R, N> {
        self.slot.wait().await
    }

    /// Whether a snapshot is waiting.
    pub fn is_pending(&self) -> bool {
        self.slot.signaled()
    }
}

impl<R, const N: usize> Default for SnapshotMailbox<R, N> {
    fn default() -> Self {
        Self::new()
    }
}
