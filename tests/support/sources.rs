use std::io::{self, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use apiclient::{EmbeddedResources, ResourceSource};

/// Serves the bundled resources while switched on and counts every open.
///
/// Clones share the switch and the counter, so a test can keep one handle
/// after moving the source into a provider.
#[derive(Clone, Debug)]
pub struct SwitchableSource {
    available: Arc<AtomicBool>,
    opens: Arc<AtomicUsize>,
    delay: Duration,
}

impl SwitchableSource {
    /// A source that serves the bundled resources.
    pub fn available() -> Self {
        Self::with_availability(true)
    }

    /// A source that reports every resource as missing until switched on.
    pub fn unavailable() -> Self {
        Self::with_availability(false)
    }

    fn with_availability(available: bool) -> Self {
        Self {
            available: Arc::new(AtomicBool::new(available)),
            opens: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Sleep for `delay` inside every open to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the bundled resources available from now on.
    pub fn switch_on(&self) {
        self.available.store(true, Ordering::SeqCst);
    }

    /// Number of times `open` has been called.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl ResourceSource for SwitchableSource {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("resource \"{name}\" has not been bundled yet"),
            ));
        }
        EmbeddedResources.open(name)
    }
}
