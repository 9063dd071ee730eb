use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_channel::Receiver;
use futures::Stream;

use crate::{GeolocationState, Subscription};

/// A stream of geolocation snapshots, starting with the current one.
///
/// Created by [`StateManager::watch`](crate::StateManager::watch). Dropping
/// the stream unregisters its listener.
pub struct StateStream {
    // Declared first so the listener goes away before the channel closes.
    subscription: Subscription,
    receiver: Pin<Box<Receiver<GeolocationState>>>,
}

impl StateStream {
    pub(crate) fn new(receiver: Receiver<GeolocationState>, subscription: Subscription) -> Self {
        Self {
            subscription,
            receiver: Box::pin(receiver),
        }
    }

    /// Snapshots delivered but not yet consumed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Stream for StateStream {
    type Item = GeolocationState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for StateStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStream")
            .field("listener", &self.subscription.id())
            .field("pending", &self.pending())
            .finish()
    }
}
