//! Shared slot for the cancellation token of the in-flight request.
//!
//! The slot holds at most one token. Dispatching a request arms a fresh token
//! and replaces whatever was there (last write wins); a caller that wants to
//! cancel must go through the slot rather than keep an old token around.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct SlotState {
    generation: u64,
    token: Option<CancellationToken>,
}

#[derive(Clone, Default)]
pub struct CancelSlot {
    inner: Arc<Mutex<SlotState>>,
}

/// Token installed by one dispatch. Dropping it clears the slot unless a
/// newer dispatch has replaced it.
pub struct ArmedToken {
    pub token: CancellationToken,
    generation: u64,
    slot: CancelSlot,
}

impl Drop for ArmedToken {
    fn drop(&mut self) {
        let mut state = self.slot.lock();
        if state.generation == self.generation {
            state.token = None;
        }
    }
}

impl CancelSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // The slot only ever holds plain data, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Install a fresh token, replacing any previous one.
    pub fn arm(&self) -> ArmedToken {
        let mut state = self.lock();
        state.generation = state.generation.wrapping_add(1);
        let token = CancellationToken::new();
        state.token = Some(token.clone());
        ArmedToken {
            token,
            generation: state.generation,
            slot: self.clone(),
        }
    }

    /// Fire the current token. Returns `false` when nothing is in flight.
    pub fn cancel(&self) -> bool {
        let state = self.lock();
        match &state.token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.lock().token.is_some()
    }
}
