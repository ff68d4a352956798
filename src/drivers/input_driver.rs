use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::Event;

use crate::constants::INPUT_POLL_MS;
use crate::queue::{MessageSender, QueueItem};

pub trait InputDriver {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;
    fn read(&mut self) -> io::Result<Event>;
    fn set_mouse_capture(&mut self, _enabled: bool) -> io::Result<()> {
        Ok(())
    }
}

impl<T: InputDriver + ?Sized> InputDriver for &mut T {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        (**self).read()
    }

    fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
        (**self).set_mouse_capture(enabled)
    }
}

/// Run `driver` on a producer thread that only ever enqueues raw input.
///
/// The thread exits when `stop` is raised, when the queue is gone, or when
/// the driver reports an I/O error.
pub fn spawn_input_thread<D>(
    mut driver: D,
    sender: MessageSender,
    stop: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    D: InputDriver + Send + 'static,
{
    thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            let interval = Duration::from_millis(INPUT_POLL_MS);
            while !stop.load(Ordering::Relaxed) {
                match driver.poll(interval) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(err) => {
                        tracing::error!(%err, "input poll failed");
                        break;
                    }
                }
                let event = match driver.read() {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::error!(%err, "input read failed");
                        break;
                    }
                };
                if sender.send(QueueItem::Input(event)).is_err() {
                    break;
                }
            }
            tracing::debug!("input thread stopped");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MessageQueue;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::collections::VecDeque;

    struct Scripted {
        events: VecDeque<Event>,
    }

    impl InputDriver for Scripted {
        fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
            if self.events.is_empty() {
                Err(io::Error::other("script finished"))
            } else {
                Ok(true)
            }
        }

        fn read(&mut self) -> io::Result<Event> {
            self.events
                .pop_front()
                .ok_or_else(|| io::Error::other("script finished"))
        }
    }

    #[test]
    fn input_thread_forwards_events_in_order() {
        let queue = MessageQueue::new();
        let driver = Scripted {
            events: VecDeque::from(vec![
                Event::Key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)),
                Event::Resize(10, 5),
            ]),
        };
        let stop = Arc::new(AtomicBool::new(false));
        let handle = spawn_input_thread(driver, queue.sender(), stop).unwrap();
        handle.join().unwrap();

        let first = queue.pop_timeout(Duration::from_millis(100));
        assert!(matches!(
            first,
            Some(QueueItem::Input(Event::Key(k))) if k.code == KeyCode::Char('a')
        ));
        let second = queue.pop_timeout(Duration::from_millis(100));
        assert!(matches!(second, Some(QueueItem::Input(Event::Resize(10, 5)))));
    }

    #[test]
    fn blanket_impl_for_mut_ref_works() {
        let mut d = Scripted {
            events: VecDeque::from(vec![Event::FocusGained]),
        };
        let mut by_ref = &mut d;
        assert!(<&mut Scripted as InputDriver>::poll(&mut by_ref, Duration::ZERO).unwrap());
        assert!(matches!(
            <&mut Scripted as InputDriver>::read(&mut by_ref).unwrap(),
            Event::FocusGained
        ));
    }
}
