use std::sync::{Arc, Mutex};
use wasm_bindgen::JsCast;

/// Settle delay before the remark is re-derived.
pub(crate) const REMARK_SETTLE_MS: i32 = 500;
/// Settle delay before a postal code triggers an officer lookup.
pub(crate) const POSTAL_SETTLE_MS: i32 = 600;

/// Single-slot deferred action, bookkeeping half.
///
/// Every `schedule` supersedes the previous one; only the newest ticket is
/// ever honoured by `take`, and at most once. The timer half lives in
/// [`Debouncer`], which may still fire stale tickets; they are simply refused.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct DebounceSlot {
    latest: u64,
    armed: bool,
}

impl DebounceSlot {
    pub fn schedule(&mut self) -> u64 {
        self.latest = self.latest.wrapping_add(1);
        self.armed = true;
        self.latest
    }

    /// Consumes `ticket` when it is the pending one.
    pub fn take(&mut self, ticket: u64) -> bool {
        if self.armed && ticket == self.latest {
            self.armed = false;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.armed
    }
}

/// Browser timer with one outstanding `setTimeout` at most.
#[derive(Clone, Default)]
pub(crate) struct Debouncer {
    handle: Arc<Mutex<Option<i32>>>,
}

impl Debouncer {
    pub fn schedule(&self, delay_ms: i32, f: impl FnOnce() + 'static) {
        let Some(win) = web_sys::window() else {
            return;
        };
        self.cancel();

        let handle = self.handle.clone();
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || {
            if let Ok(mut h) = handle.lock() {
                *h = None;
            }
            f();
        });

        let tid = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                delay_ms,
            )
            .unwrap_or(0);

        if let Ok(mut h) = self.handle.lock() {
            *h = Some(tid);
        }
    }

    pub fn cancel(&self) {
        let Ok(mut h) = self.handle.lock() else {
            return;
        };
        if let Some(tid) = h.take() {
            if let Some(win) = web_sys::window() {
                win.clear_timeout_with_handle(tid);
            }
        }
    }
}
