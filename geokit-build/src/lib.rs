//! Shared build utilities for geokit crates.
//!
//! This crate provides common functionality for:
//! - Apple: Swift bridge generation and Swift compilation
//! - Android: Kotlin → DEX compilation
//!
//! Every helper checks `CARGO_CFG_TARGET_OS` itself, so build scripts can call
//! them unconditionally.
//!
//! # Usage
//!
//! In your `build.rs`:
//!
//! ```ignore
//! use geokit_build::{AppleSwiftConfig, build_kotlin, compile_swift};
//!
//! fn main() {
//!     compile_swift(
//!         "src/sys/apple/mod.rs",
//!         &AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "Helper")
//!             .swift_source("src/sys/apple/Helper.swift")
//!             .framework("CoreLocation"),
//!     );
//!     build_kotlin(&["src/sys/android/Helper.kt"]);
//! }
//! ```

#![warn(missing_docs)]

mod android;
mod apple;

pub use android::{build_kotlin, find_android_jar, find_d8_jar};
pub use apple::{AppleSwiftConfig, compile_swift};
