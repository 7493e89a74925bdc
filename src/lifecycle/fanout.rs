//! Writer-side registry of subscriber channels.

use tokio::sync::mpsc;

/// Channels of the active subscribers of one stream, in subscription order.
#[derive(Debug)]
pub(crate) struct Subscribers<T> {
    senders: Vec<mpsc::UnboundedSender<T>>,
}

impl<T: Clone> Subscribers<T> {
    pub(crate) fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Registers a subscriber.
    pub(crate) fn subscribe(&mut self) -> mpsc::UnboundedReceiver<T> {
        self.prune();
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        rx
    }

    /// Registers a subscriber whose first item is `first`.
    pub(crate) fn subscribe_with(&mut self, first: T) -> mpsc::UnboundedReceiver<T> {
        self.prune();
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(first).is_ok() {
            self.senders.push(tx);
        }
        rx
    }

    /// Delivers `item` to every subscriber in order. Subscribers whose
    /// receiver is gone are dropped. Returns how many were dropped.
    pub(crate) fn publish(&mut self, item: &T) -> usize {
        let before = self.senders.len();
        self.senders.retain(|tx| tx.send(item.clone()).is_ok());
        before - self.senders.len()
    }

    /// Drops senders whose receiver is gone, so idle streams do not
    /// accumulate dead subscribers between deliveries.
    fn prune(&mut self) {
        self.senders.retain(|tx| !tx.is_closed());
    }

    /// Drops every sender, which ends each subscriber's stream once its
    /// buffered items are drained.
    pub(crate) fn close(&mut self) {
        self.senders.clear();
    }

    /// Number of subscribers whose receiver is still alive.
    pub(crate) fn len(&self) -> usize {
        self.senders.iter().filter(|tx| !tx.is_closed()).count()
    }
}

/// A receiver that yields `first`, if any, and then ends.
pub(crate) fn completed<T>(first: Option<T>) -> mpsc::UnboundedReceiver<T> {
    let (tx, rx) = mpsc::unbounded_channel();
    if let Some(item) = first {
        // rx is still held here, so the send cannot fail.
        let _ = tx.send(item);
    }
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_all_subscribers_in_order() {
        let mut subscribers = Subscribers::new();
        let mut a = subscribers.subscribe();
        let mut b = subscribers.subscribe();
        subscribers.publish(&1);
        subscribers.publish(&2);
        assert_eq!(a.try_recv().unwrap(), 1);
        assert_eq!(a.try_recv().unwrap(), 2);
        assert_eq!(b.try_recv().unwrap(), 1);
        assert_eq!(b.try_recv().unwrap(), 2);
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let mut subscribers = Subscribers::new();
        let keep = subscribers.subscribe();
        let gone = subscribers.subscribe();
        drop(gone);
        assert_eq!(subscribers.len(), 1);
        assert_eq!(subscribers.publish(&"x"), 1);
        assert_eq!(subscribers.senders.len(), 1);
        drop(keep);
    }

    #[test]
    fn resubscribing_on_idle_stream_does_not_accumulate() {
        let mut subscribers = Subscribers::<u32>::new();
        let keep = subscribers.subscribe_with(0);
        for _ in 0..1_000 {
            drop(subscribers.subscribe());
            drop(subscribers.subscribe_with(1));
        }
        assert!(subscribers.senders.len() <= 2);
        assert_eq!(subscribers.len(), 1);
        drop(keep);
    }

    #[test]
    fn subscribe_with_delivers_first_item() {
        let mut subscribers = Subscribers::new();
        let mut rx = subscribers.subscribe_with(0);
        subscribers.publish(&1);
        assert_eq!(rx.try_recv().unwrap(), 0);
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[test]
    fn completed_receiver_ends_after_first_item() {
        let mut rx = completed(Some("done"));
        assert_eq!(rx.try_recv().unwrap(), "done");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn close_ends_streams_after_buffered_items() {
        let mut subscribers = Subscribers::new();
        let mut rx = subscribers.subscribe();
        subscribers.publish(&7);
        subscribers.close();
        assert_eq!(rx.try_recv().unwrap(), 7);
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
