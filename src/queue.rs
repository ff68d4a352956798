//! Message queue between producer threads and the single dispatch thread.
//!
//! Producers (input thread, network notifiers, timers) hold a cloned
//! [`MessageSender`] and only ever enqueue. The dispatch thread owns the
//! receiving end together with the window tree.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendError, Sender, TryRecvError};
use crossterm::event::Event;

use crate::message::Message;

/// One unit of work for the dispatch loop.
#[derive(Debug)]
pub enum QueueItem {
    /// A message already addressed to a window.
    Message(Message),
    /// Raw terminal input, translated and targeted on the dispatch thread.
    Input(Event),
}

impl From<Message> for QueueItem {
    fn from(msg: Message) -> Self {
        QueueItem::Message(msg)
    }
}

/// Cloneable, `Send` producer handle.
#[derive(Debug, Clone)]
pub struct MessageSender {
    tx: Sender<QueueItem>,
}

impl MessageSender {
    pub fn send(&self, item: QueueItem) -> Result<(), SendError<QueueItem>> {
        self.tx.send(item)
    }

    pub fn post(&self, msg: Message) -> Result<(), SendError<QueueItem>> {
        self.tx.send(QueueItem::Message(msg))
    }
}

#[derive(Debug)]
pub struct MessageQueue {
    tx: Sender<QueueItem>,
    rx: Receiver<QueueItem>,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> MessageSender {
        MessageSender {
            tx: self.tx.clone(),
        }
    }

    /// Enqueue from the dispatch thread itself. The queue owns a receiver,
    /// so this cannot fail.
    pub fn push(&self, item: QueueItem) {
        if self.tx.send(item).is_err() {
            tracing::warn!("message queue closed; dropping item");
        }
    }

    pub fn try_pop(&self) -> Option<QueueItem> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Block for at most `timeout` waiting for the next item.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<QueueItem> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use crate::window::WindowId;
    use std::thread;

    #[test]
    fn producers_on_other_threads_feed_fifo() {
        let queue = MessageQueue::new();
        let sender = queue.sender();
        let target = WindowId::from_raw(3);
        let handle = thread::spawn(move || {
            sender.post(Message::new(target, MessageKind::Display)).unwrap();
            sender.post(Message::new(target, MessageKind::Close)).unwrap();
        });
        handle.join().unwrap();
        assert_eq!(queue.len(), 2);
        let kinds: Vec<MessageKind> = std::iter::from_fn(|| queue.try_pop())
            .map(|item| match item {
                QueueItem::Message(msg) => msg.kind,
                QueueItem::Input(_) => panic!("unexpected input"),
            })
            .collect();
        assert_eq!(kinds, vec![MessageKind::Display, MessageKind::Close]);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_timeout_returns_none_when_idle() {
        let queue = MessageQueue::new();
        assert!(queue.pop_timeout(Duration::from_millis(5)).is_none());
    }
}
