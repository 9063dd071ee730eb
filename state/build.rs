//! Build script for geokit-state.
//!
//! Apple targets compile the authorization observer through swift-bridge.
//! Android targets compile the provider change receiver into an embedded DEX.

use geokit_build::{AppleSwiftConfig, build_kotlin, compile_swift};

fn main() {
    compile_swift(
        "src/sys/apple/mod.rs",
        &AppleSwiftConfig::new(env!("CARGO_PKG_NAME"), "GeokitState")
            .swift_source("src/sys/apple/AuthorizationObserver.swift")
            .framework("CoreLocation"),
    );

    build_kotlin(&["src/sys/android/ProviderChangeReceiver.kt"]);
}
