use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::domain::federation_model::order_registry::order_registry::OrderRegistry;
use crate::domain::federation_model::processors::order_processor::OrderProcessor;
use crate::error::{Error, Result};

/// Runs every processor on its own named thread until [`ProcessorRunner::stop`] is called.
///
/// A thread sleeps `interval` between two passes. Stopping wakes sleeping threads, a pass that is
/// already running is finished first.
#[derive(Debug)]
pub struct ProcessorRunner {
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl ProcessorRunner {
    pub fn start(registry: Arc<OrderRegistry>, processors: Vec<(Arc<dyn OrderProcessor>, Duration)>) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut runner = ProcessorRunner { shutdown, handles: Vec::with_capacity(processors.len()) };

        for (processor, interval) in processors {
            let registry = registry.clone();
            let shutdown = runner.shutdown.clone();
            let name = processor.name();

            let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
                log::info!("{} started, passes every {:?}.", processor.name(), interval);
                while !shutdown.load(Ordering::Acquire) {
                    let visited = processor.run_pass(&registry);
                    if visited > 0 {
                        log::trace!("{} visited {} orders", processor.name(), visited);
                    }
                    thread::park_timeout(interval);
                }
                log::info!("{} stopped.", processor.name());
            });

            match spawned {
                Ok(handle) => runner.handles.push(handle),
                Err(e) => {
                    runner.stop();
                    return Err(Error::unexpected(format!("Failed to spawn {} thread: {}", name, e)));
                }
            }
        }

        Ok(runner)
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire) && self.handles.iter().any(|handle| !handle.is_finished())
    }

    /// Signals every thread and waits for them to finish their current pass.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        for handle in &self.handles {
            handle.thread().unpark();
        }
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("processor").to_string();
            if handle.join().is_err() {
                log::error!("{} panicked", name);
            }
        }
    }
}

impl Drop for ProcessorRunner {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop();
        }
    }
}
