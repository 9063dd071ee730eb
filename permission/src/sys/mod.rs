//! Platform-specific authorization checks.

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
pub(crate) use apple::check;

#[cfg(target_os = "android")]
pub(crate) use android::check;

#[cfg(target_os = "windows")]
pub(crate) use windows::check;

#[cfg(target_os = "linux")]
pub(crate) use linux::check;

// Fallback for unsupported platforms (compile-time stub)
#[cfg(not(any(
    target_os = "ios",
    target_os = "macos",
    target_os = "android",
    target_os = "windows",
    target_os = "linux"
)))]
pub(crate) async fn check() -> Result<crate::LocationAuthorization, crate::PermissionError> {
    Err(crate::PermissionError::NotSupported)
}
