//! # ormforms-signals
//!
//! Ordered observer lists. A [`Signal`] is owned by the object that fires it
//! (a form binder, say), so there is no process-wide registry: each request
//! builds its own binder and connects its own receivers.
//!
//! The receiver type is a trait object chosen by the owner, which lets
//! receivers borrow the payload for the duration of the call.
//!
//! ## Usage
//!
//! ```
//! use ormforms_signals::Signal;
//! use std::sync::Arc;
//!
//! type Saved = dyn Fn(&str, u64) + Send + Sync;
//!
//! let mut signal: Signal<Saved> = Signal::new();
//! signal.connect("audit", Arc::new(|table: &str, id: u64| {
//!     println!("saved {table}#{id}");
//! }));
//!
//! let fired = signal.dispatch(|receiver| receiver("article", 7));
//! assert_eq!(fired, 1);
//! ```

use std::fmt;
use std::sync::Arc;

/// An ordered list of named receivers.
///
/// Receivers are invoked synchronously, in the order they were connected.
pub struct Signal<F: ?Sized> {
    receivers: Vec<(String, Arc<F>)>,
}

impl<F: ?Sized> Default for Signal<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> Clone for Signal<F> {
    fn clone(&self) -> Self {
        Self {
            receivers: self.receivers.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for Signal<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field(
                "receivers",
                &self.receivers.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<F: ?Sized> Signal<F> {
    /// Creates a signal with no connected receivers.
    pub const fn new() -> Self {
        Self {
            receivers: Vec::new(),
        }
    }

    /// Connects a receiver.
    ///
    /// If a receiver with the same ID is already connected, it is replaced in
    /// place and keeps its position.
    pub fn connect(&mut self, receiver_id: impl Into<String>, receiver: Arc<F>) {
        let id = receiver_id.into();
        if let Some(entry) = self.receivers.iter_mut().find(|(rid, _)| *rid == id) {
            entry.1 = receiver;
        } else {
            self.receivers.push((id, receiver));
        }
    }

    /// Disconnects the receiver with the given ID.
    ///
    /// Returns `true` if a receiver was found and removed.
    pub fn disconnect(&mut self, receiver_id: &str) -> bool {
        let len_before = self.receivers.len();
        self.receivers.retain(|(id, _)| id != receiver_id);
        self.receivers.len() < len_before
    }

    /// Calls `invoke` once per receiver, in connection order.
    ///
    /// Returns the number of receivers invoked.
    pub fn dispatch(&self, mut invoke: impl FnMut(&F)) -> usize {
        for (id, receiver) in &self.receivers {
            tracing::trace!(receiver = %id, "dispatching signal");
            invoke(receiver);
        }
        self.receivers.len()
    }

    /// Returns the IDs of connected receivers, in order.
    pub fn receiver_ids(&self) -> impl Iterator<Item = &str> {
        self.receivers.iter().map(|(id, _)| id.as_str())
    }

    /// Returns the number of connected receivers.
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Returns `true` if no receiver is connected.
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}
