//! Application foreground/background signal.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{StateError, StateResult};

/// Application lifecycle transitions reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppLifecycle {
    /// The application came to the foreground.
    Foreground,
    /// The application is visible but not receiving events.
    Inactive,
    /// The application went to the background.
    Background,
}

/// The host reported a lifecycle state this crate does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown app lifecycle state: {0}")]
pub struct UnknownLifecycle(pub String);

impl FromStr for AppLifecycle {
    type Err = UnknownLifecycle;

    /// Parses the host state names `active`, `inactive` and `background`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" | "foreground" => Ok(Self::Foreground),
            "inactive" => Ok(Self::Inactive),
            "background" => Ok(Self::Background),
            other => Err(UnknownLifecycle(other.to_string())),
        }
    }
}

/// Receives lifecycle transitions.
pub trait LifecycleDelegate: Send + Sync {
    /// Called on every transition.
    fn on_lifecycle(&self, event: AppLifecycle);
}

/// A source of lifecycle transitions with a single subscriber.
pub trait LifecycleSignal: Send + Sync {
    /// Register `delegate`, replacing any previous one.
    ///
    /// # Errors
    /// Returns [`StateError::Subscription`] if the host refuses the registration.
    fn subscribe(&self, delegate: Arc<dyn LifecycleDelegate>) -> StateResult<()>;

    /// Remove the registered delegate.
    ///
    /// # Errors
    /// Returns [`StateError::NotListening`] if nothing is registered.
    fn unsubscribe(&self) -> StateResult<()>;
}

/// A [`LifecycleSignal`] the host drives by calling [`notify`](Self::notify)
/// from its own lifecycle callbacks.
#[derive(Default)]
pub struct LifecycleHub {
    delegate: Mutex<Option<Arc<dyn LifecycleDelegate>>>,
}

impl LifecycleHub {
    /// Create a hub with no subscriber.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a transition to the subscriber, if any.
    pub fn notify(&self, event: AppLifecycle) {
        let delegate = self
            .delegate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(delegate) = delegate {
            delegate.on_lifecycle(event);
        }
    }

    /// Parse a host state name and forward it.
    ///
    /// # Errors
    /// Returns [`UnknownLifecycle`] for unrecognized names; nothing is forwarded.
    pub fn notify_str(&self, state: &str) -> Result<(), UnknownLifecycle> {
        self.notify(state.parse()?);
        Ok(())
    }

    /// Whether a subscriber is registered.
    #[must_use]
    pub fn has_subscriber(&self) -> bool {
        self.delegate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for LifecycleHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHub")
            .field("subscribed", &self.has_subscriber())
            .finish()
    }
}

impl LifecycleSignal for LifecycleHub {
    fn subscribe(&self, delegate: Arc<dyn LifecycleDelegate>) -> StateResult<()> {
        *self.delegate.lock().unwrap_or_else(PoisonError::into_inner) = Some(delegate);
        Ok(())
    }

    fn unsubscribe(&self) -> StateResult<()> {
        self.delegate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|_| ())
            .ok_or(StateError::NotListening)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl LifecycleDelegate for Counter {
        fn on_lifecycle(&self, event: AppLifecycle) {
            if event == AppLifecycle::Foreground {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn parses_host_state_names() {
        assert_eq!("active".parse::<AppLifecycle>(), Ok(AppLifecycle::Foreground));
        assert_eq!("inactive".parse::<AppLifecycle>(), Ok(AppLifecycle::Inactive));
        assert_eq!("background".parse::<AppLifecycle>(), Ok(AppLifecycle::Background));
        assert!("unknown".parse::<AppLifecycle>().is_err());
    }

    #[test]
    fn hub_forwards_until_unsubscribed() {
        let hub = LifecycleHub::new();
        let counter = Arc::new(Counter::default());
        hub.subscribe(counter.clone()).unwrap();

        hub.notify(AppLifecycle::Foreground);
        hub.notify_str("background").unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);

        hub.unsubscribe().unwrap();
        hub.notify(AppLifecycle::Foreground);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        assert_eq!(hub.unsubscribe(), Err(StateError::NotListening));
    }
}
