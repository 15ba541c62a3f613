use std::thread;

/// Spawning abstraction for the worker threads a session needs (device
/// reader, status inspector, stdin watcher).
pub trait Scheduler {
    fn spawn<F>(&self, f: F) -> thread::JoinHandle<()>
    where
        F: FnOnce() + Send + 'static;
}

pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, f: F) -> thread::JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        thread::spawn(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_thread_scheduler_join() {
        let scheduler = ThreadScheduler::new();
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        let handle = scheduler.spawn(move || {
            flag_clone.store(true, Ordering::SeqCst);
        });

        handle.join().unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }
}
