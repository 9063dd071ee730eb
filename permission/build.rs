//! Build script for geokit-permission.
//!
//! Apple targets compile the `CoreLocation` authorization helper through
//! swift-bridge. Android needs no helper classes: authorization is read
//! through plain JNI calls.

use geokit_build::{AppleSwiftConfig, compile_swift};

fn main() {
    compile_swift(
        "src/sys/apple/mod.rs",
        &AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "GeokitPermission")
            .swift_source("src/sys/apple/LocationAuthorization.swift")
            .framework("CoreLocation"),
    );
}
