//! The concrete "current host connection" tracker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use hostlink_session::HostRegistry;
use hostlink_transport::EndpointId;

type DisconnectCallback = Box<dyn Fn() + Send + Sync>;

/// Tracks which endpoint is the process's current connection to a host
/// and relays the one-shot "disconnected" event to the application.
///
/// An endpoint consults this during teardown: only the current endpoint
/// may announce departure, and the application callback fires at most
/// once per connection attempt. Registering a new current endpoint
/// re-arms the callback for the next attempt.
pub struct ConnectionRegistry {
    current: Mutex<Option<EndpointId>>,
    delivered: AtomicBool,
    on_disconnected: DisconnectCallback,
}

impl ConnectionRegistry {
    /// Creates a registry with no current connection. `on_disconnected`
    /// runs when the current endpoint announces its departure.
    pub fn new(on_disconnected: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            current: Mutex::new(None),
            delivered: AtomicBool::new(false),
            on_disconnected: Box::new(on_disconnected),
        }
    }

    /// Makes `id` the current connection and re-arms the callback.
    pub fn set_current(&self, id: EndpointId) {
        let mut current = self.current.lock().expect("registry mutex poisoned");
        *current = Some(id);
        self.delivered.store(false, Ordering::SeqCst);
    }

    /// Clears the current connection without firing the callback.
    pub fn clear(&self) {
        let mut current = self.current.lock().expect("registry mutex poisoned");
        *current = None;
    }

    /// The current connection's endpoint id, if any.
    pub fn current(&self) -> Option<EndpointId> {
        *self.current.lock().expect("registry mutex poisoned")
    }
}

impl HostRegistry for ConnectionRegistry {
    fn is_current(&self, id: EndpointId) -> bool {
        self.current() == Some(id)
    }

    fn notify_disconnected_from_host(&self) {
        // swap returns the previous value, so exactly one caller wins.
        if !self.delivered.swap(true, Ordering::SeqCst) {
            (self.on_disconnected)();
        } else {
            tracing::warn!("duplicate disconnect notification suppressed");
        }
    }
}
