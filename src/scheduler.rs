use log::{debug, error};
use std::thread;

/// Runs background helpers of the polling context (console reader and the like).
pub trait Scheduler {
    fn spawn<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static;
}

#[derive(Debug, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match thread::Builder::new().name(name.to_string()).spawn(f) {
            Ok(_) => debug!("Spawned helper thread '{}'", name),
            Err(e) => error!("Failed to spawn helper thread '{}': {}", name, e),
        }
    }
}
