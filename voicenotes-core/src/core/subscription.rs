//! Push-based live sequences with explicit cancellation.
//!
//! A [`Subscription`] is the consuming end of a producer task. The producer
//! pushes items through an [`Emitter`]; the consumer pulls them with
//! [`Subscription::next`] or as a [`Stream`]. Cancelling or dropping the
//! subscription aborts the producer, so nothing keeps running once the UI
//! surface that owned it goes away.

use futures_util::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Items a producer may run ahead of its consumer before `emit` waits.
const SUBSCRIPTION_BUFFER: usize = 16;

/// Producer half handed to the task backing a [`Subscription`].
pub struct Emitter<T> {
    sender: mpsc::Sender<T>,
}

impl<T> Emitter<T> {
    /// Pushes `item` to the subscriber. Returns `false` once the subscriber
    /// is gone, at which point the producer should stop.
    pub async fn emit(&self, item: T) -> bool {
        self.sender.send(item).await.is_ok()
    }
}

/// Consumer end of a live sequence.
pub struct Subscription<T> {
    receiver: mpsc::Receiver<T>,
    producer: JoinHandle<()>,
}

impl<T: Send + 'static> Subscription<T> {
    /// Spawns `producer` on the current tokio runtime and subscribes to it.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(Emitter<T>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let producer = tokio::spawn(producer(Emitter { sender }));
        Self { receiver, producer }
    }
}

impl<T> Subscription<T> {
    /// Waits for the next item; `None` once the producer has finished.
    pub async fn next(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Stops the producer. Equivalent to dropping the subscription.
    pub fn cancel(self) {
        drop(self);
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
