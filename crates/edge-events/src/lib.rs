//! The observer bus, cancellation latch, and work queue that tie the
//! background subsystems (the syntax parser's thread pool, async input) to
//! the single-threaded main loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A one-shot latch used to cancel in-flight background work (§4.4,
/// §5). Cheap to clone and share between the scheduler and the job.
#[derive(Clone, Default)]
pub struct Notification {
    flag: Arc<AtomicBool>,
}

impl Notification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn has_been_notified(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A registry of callbacks notified, in registration order, whenever some
/// event `T` occurs. Used by `OpenBuffer` (content-modified notifications)
/// and by the syntax parser (tree-installed notifications, which happen
/// strictly after the new tree is installed — §4.4).
pub struct Observers<T> {
    callbacks: Mutex<Vec<Box<dyn Fn(&T) + Send + Sync>>>,
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self {
            callbacks: Mutex::new(Vec::new()),
        }
    }
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) {
        self.callbacks.lock().unwrap().push(Box::new(f));
    }

    pub fn notify(&self, event: &T) {
        for cb in self.callbacks.lock().unwrap().iter() {
            cb(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A FIFO of callbacks scheduled to run on the main thread between input
/// events (§4.6 step 4, §5). Background threads deliver their results here
/// instead of touching editor state directly.
#[derive(Default)]
pub struct WorkQueue {
    items: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, f: impl FnOnce() + Send + 'static) {
        self.items.lock().unwrap().push(Box::new(f));
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    /// Drain every currently-queued item and run it. Items scheduled by a
    /// callback while draining run on the *next* call, not this one —
    /// matching the FIFO contract without risking an unbounded loop if a
    /// callback keeps re-scheduling itself.
    pub fn drain_and_run(&self) {
        let items = std::mem::take(&mut *self.items.lock().unwrap());
        for item in items {
            item();
        }
    }
}

/// Bounded-channel capacity for the terminal-input -> main-loop pipeline
/// (edge-input); sized generously so a burst of pasted input never blocks
/// the reader thread under ordinary load.
pub const EVENT_CHANNEL_CAP: usize = 8192;

/// The main loop's event source, unifying terminal input with internal
/// wake-ups (§4.6 step 2: "block on readable input, a scheduled work item,
/// or a watched buffer fd").
#[derive(Debug, Clone)]
pub enum LoopEvent {
    Key(char),
    WorkAvailable,
    BufferReady(String),
    Tick,
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_is_one_shot_and_shared() {
        let n = Notification::new();
        let n2 = n.clone();
        assert!(!n.has_been_notified());
        n2.notify();
        assert!(n.has_been_notified());
    }

    #[test]
    fn observers_fire_in_registration_order() {
        let observers: Observers<i32> = Observers::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let o1 = order.clone();
        observers.subscribe(move |v| o1.lock().unwrap().push(("a", *v)));
        let o2 = order.clone();
        observers.subscribe(move |v| o2.lock().unwrap().push(("b", *v)));
        observers.notify(&42);
        assert_eq!(*order.lock().unwrap(), vec![("a", 42), ("b", 42)]);
    }

    #[test]
    fn work_queue_runs_everything_scheduled_before_drain() {
        let queue = WorkQueue::new();
        let sum = Arc::new(Mutex::new(0));
        for i in 0..5 {
            let sum = sum.clone();
            queue.schedule(move || *sum.lock().unwrap() += i);
        }
        queue.drain_and_run();
        assert_eq!(*sum.lock().unwrap(), 10);
        assert!(queue.is_empty());
    }
}
