//! OS protocol event callbacks (§4.8, §6 "Observable events for
//! consumers"): registration per `ProtocolEvent` kind, with
//! callback-merge-on-reconnect semantics.

use os_protocol::Envelope;
use tracing::error;

/// What a registered callback is told happened.
#[derive(Debug, Clone)]
pub enum Notification {
    ConnectionMade,
    DataReceived(Envelope),
    DataSent(Envelope),
    ConnectionLost,
}

/// A callback is any `FnMut` that may fail; a failure is logged and does
/// not stop the driver loop (§7 "Unhandled exceptions inside handler
/// callbacks").
pub type Callback = Box<dyn FnMut(&Notification) -> Result<(), String> + Send>;

/// Callbacks registered per event kind, invoked in registration order.
#[derive(Default)]
pub struct CallbackRegistry {
    connection_made: Vec<Callback>,
    data_received: Vec<Callback>,
    data_sent: Vec<Callback>,
    connection_lost: Vec<Callback>,
}

impl CallbackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connection_made(&mut self, callback: Callback) {
        self.connection_made.push(callback);
    }

    pub fn on_data_received(&mut self, callback: Callback) {
        self.data_received.push(callback);
    }

    pub fn on_data_sent(&mut self, callback: Callback) {
        self.data_sent.push(callback);
    }

    pub fn on_connection_lost(&mut self, callback: Callback) {
        self.connection_lost.push(callback);
    }

    /// Merge `other`'s subscribers after this registry's own, preserving
    /// registration order within each kind (§4.8 "callbacks are merged in
    /// registration order" — used when a new protocol instance wants to
    /// inherit a prior instance's subscribers across a reconnect).
    #[must_use]
    pub fn merge(mut self, mut other: Self) -> Self {
        self.connection_made.append(&mut other.connection_made);
        self.data_received.append(&mut other.data_received);
        self.data_sent.append(&mut other.data_sent);
        self.connection_lost.append(&mut other.connection_lost);
        self
    }

    /// Dispatch `notification` to every subscriber of its kind. A
    /// callback returning `Err` is logged at `error!` with its position
    /// and does not prevent later callbacks from running.
    pub fn dispatch(&mut self, notification: &Notification) {
        let callbacks = match notification {
            Notification::ConnectionMade => &mut self.connection_made,
            Notification::DataReceived(_) => &mut self.data_received,
            Notification::DataSent(_) => &mut self.data_sent,
            Notification::ConnectionLost => &mut self.connection_lost,
        };
        for (index, callback) in callbacks.iter_mut().enumerate() {
            if let Err(err) = callback(notification) {
                error!(callback_index = index, error = %err, "callback failed, continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn dispatch_invokes_only_matching_kind() {
        let mut registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        registry.on_connection_made(Box::new(move |_| {
            seen_clone.lock().unwrap().push("connection_made");
            Ok(())
        }));
        let seen_clone = Arc::clone(&seen);
        registry.on_connection_lost(Box::new(move |_| {
            seen_clone.lock().unwrap().push("connection_lost");
            Ok(())
        }));

        registry.dispatch(&Notification::ConnectionMade);
        assert_eq!(*seen.lock().unwrap(), vec!["connection_made"]);
    }

    #[test]
    fn a_failing_callback_does_not_block_the_next_one() {
        let mut registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        registry.on_connection_made(Box::new(|_| Err("boom".to_owned())));
        let seen_clone = Arc::clone(&seen);
        registry.on_connection_made(Box::new(move |_| {
            seen_clone.lock().unwrap().push("second");
            Ok(())
        }));

        registry.dispatch(&Notification::ConnectionMade);
        assert_eq!(*seen.lock().unwrap(), vec!["second"]);
    }

    #[test]
    fn merge_preserves_registration_order_within_a_kind() {
        let mut first = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        first.on_connection_made(Box::new(move |_| {
            seen_clone.lock().unwrap().push(1);
            Ok(())
        }));

        let mut second = CallbackRegistry::new();
        let seen_clone = Arc::clone(&seen);
        second.on_connection_made(Box::new(move |_| {
            seen_clone.lock().unwrap().push(2);
            Ok(())
        }));

        let mut merged = first.merge(second);
        merged.dispatch(&Notification::ConnectionMade);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }
}
