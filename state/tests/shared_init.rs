//! First use of the process-wide manager from many threads at once.
//!
//! Kept in its own test binary: the shared manager and the logger are
//! process-wide and must start out empty.

#![cfg(target_os = "linux")]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use geokit_state::{shared_lifecycle, shared_or_init};
use log::{LevelFilter, Log, Metadata, Record};

static STARTS: AtomicUsize = AtomicUsize::new(0);
static FOREGROUND_REFRESHES: AtomicUsize = AtomicUsize::new(0);

/// Counts the manager's own log lines for starting and foreground refreshes.
struct CountingLogger;

impl Log for CountingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.target().starts_with("geokit_state")
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.args().to_string().as_str() {
            "listening for geolocation state changes" => {
                STARTS.fetch_add(1, Ordering::SeqCst);
            }
            "refreshing geolocation state (foreground)" => {
                FOREGROUND_REFRESHES.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }

    fn flush(&self) {}
}

static LOGGER: CountingLogger = CountingLogger;

#[test]
fn concurrent_first_use_builds_one_manager_that_follows_foreground() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Debug);

    let barrier = Arc::new(Barrier::new(16));
    let threads: Vec<_> = (0..16)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                shared_or_init().unwrap()
            })
        })
        .collect();
    let managers: Vec<_> = threads
        .into_iter()
        .map(|thread| thread.join().unwrap())
        .collect();

    assert_eq!(STARTS.load(Ordering::SeqCst), 1);

    // Every caller holds the same instance.
    let id = managers[0].add_listener(|_| {});
    assert!(managers.iter().all(|manager| manager.listener_count() == 1));
    assert!(managers[15].remove_listener(id));

    let lifecycle = shared_lifecycle();
    assert!(lifecycle.has_subscriber());

    lifecycle.notify_str("background").unwrap();
    lifecycle.notify_str("inactive").unwrap();
    assert_eq!(FOREGROUND_REFRESHES.load(Ordering::SeqCst), 0);

    lifecycle.notify_str("active").unwrap();
    assert_eq!(FOREGROUND_REFRESHES.load(Ordering::SeqCst), 1);
}
