//! Platform-specific state readers.

#[cfg(any(target_os = "ios", target_os = "macos"))]
mod apple;

/// Android platform implementation.
#[cfg(target_os = "android")]
pub mod android;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

// Re-export platform implementations
#[cfg(any(target_os = "ios", target_os = "macos"))]
pub use apple::AppleStateReader as PlatformReader;

#[cfg(target_os = "android")]
pub use android::AndroidStateReader as PlatformReader;

#[cfg(target_os = "windows")]
pub use windows::WindowsStateReader as PlatformReader;

#[cfg(target_os = "linux")]
pub use linux::GeoClueStateReader as PlatformReader;

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "android",
    target_os = "windows",
    target_os = "linux"
)))]
pub use unsupported::UnsupportedReader as PlatformReader;

/// Build the reader for the current platform without host context.
#[cfg(any(target_os = "ios", target_os = "macos", target_os = "linux"))]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn default_reader() -> crate::StateResult<PlatformReader> {
    Ok(PlatformReader::new())
}

#[cfg(target_os = "windows")]
pub(crate) fn default_reader() -> crate::StateResult<PlatformReader> {
    PlatformReader::new()
}

#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "android",
    target_os = "windows",
    target_os = "linux"
)))]
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn default_reader() -> crate::StateResult<PlatformReader> {
    Ok(PlatformReader)
}

// Fallback for unsupported platforms
#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "android",
    target_os = "windows",
    target_os = "linux"
)))]
mod unsupported {
    use std::future::{Future, ready};
    use std::sync::Arc;

    use crate::{GeolocationState, PlatformStateReader, StateDelegate, StateError, StateResult};

    /// Reader for platforms without a location service.
    ///
    /// Fetches fail with [`StateError::NotSupported`]; subscribing succeeds and
    /// never delivers anything.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct UnsupportedReader;

    impl PlatformStateReader for UnsupportedReader {
        fn fetch_state(&self) -> impl Future<Output = StateResult<GeolocationState>> + Send {
            ready(Err(StateError::NotSupported))
        }

        fn subscribe(&self, _delegate: Arc<dyn StateDelegate>) -> StateResult<()> {
            Ok(())
        }

        fn unsubscribe(&self) -> StateResult<()> {
            Ok(())
        }
    }
}
