//! Apple platform build utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Configuration for Swift compilation.
#[derive(Debug, Clone)]
pub struct AppleSwiftConfig {
    /// The crate/module name (e.g., "geokit-state").
    pub pkg_name: String,
    /// Swift source files to compile, relative to the crate manifest.
    pub swift_sources: Vec<PathBuf>,
    /// Output library name (e.g., "GeolocationStateObserver").
    pub lib_name: String,
    /// Frameworks to link.
    pub frameworks: Vec<String>,
}

impl AppleSwiftConfig {
    /// Create a new config with required fields.
    #[must_use]
    pub fn new(pkg_name: impl Into<String>, lib_name: impl Into<String>) -> Self {
        Self {
            pkg_name: pkg_name.into(),
            swift_sources: Vec::new(),
            lib_name: lib_name.into(),
            frameworks: vec!["Foundation".to_string()],
        }
    }

    /// Add a Swift source file.
    #[must_use]
    pub fn swift_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.swift_sources.push(path.into());
        self
    }

    /// Add a framework to link.
    #[must_use]
    pub fn framework(mut self, name: impl Into<String>) -> Self {
        self.frameworks.push(name.into());
        self
    }
}

fn is_apple_target() -> bool {
    matches!(
        env::var("CARGO_CFG_TARGET_OS").as_deref(),
        Ok("ios" | "macos")
    )
}

fn command_stdout(command: &mut Command, what: &str) -> String {
    let output = command
        .output()
        .unwrap_or_else(|e| panic!("{what} failed to start: {e}"));
    assert!(output.status.success(), "{what} failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn swift_target(target: &str) -> &'static str {
    if target.contains("ios") {
        "arm64-apple-ios14.0"
    } else if target.contains("aarch64") {
        "arm64-apple-macos12.3"
    } else {
        "x86_64-apple-macos12.3"
    }
}

/// Compile Swift code and link it into the crate.
///
/// This handles:
/// 1. Swift bridge generation
/// 2. Creating the bridging header
/// 3. Compiling Swift to an object file
/// 4. Creating a static library
/// 5. Linking frameworks
///
/// Does nothing unless the build targets iOS or macOS.
///
/// # Arguments
/// * `bridge_rs` - Path to the Rust bridge module
/// * `config` - Swift compilation configuration
pub fn compile_swift(bridge_rs: &str, config: &AppleSwiftConfig) {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));

    println!("cargo:rerun-if-changed={bridge_rs}");
    for source in &config.swift_sources {
        println!("cargo:rerun-if-changed={}", manifest_dir.join(source).display());
    }

    if !is_apple_target() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    swift_bridge_build::parse_bridges(vec![bridge_rs])
        .write_all_concatenated(out_dir.clone(), &config.pkg_name);

    let bridging_h = write_bridging_header(&out_dir, &config.pkg_name);
    let combined_swift = write_combined_sources(&out_dir, &manifest_dir, config);

    let obj_file = out_dir.join(format!("{}.o", config.lib_name));
    let target = env::var("TARGET").expect("TARGET not set");
    let sdk = if target.contains("ios") {
        "iphoneos"
    } else {
        "macosx"
    };

    let sdk_path = command_stdout(
        Command::new("xcrun").args(["--sdk", sdk, "--show-sdk-path"]),
        "xcrun --show-sdk-path",
    );

    let mut swiftc = Command::new("swiftc");
    swiftc
        .arg("-emit-object")
        .arg("-o")
        .arg(&obj_file)
        .arg("-sdk")
        .arg(&sdk_path)
        .arg("-import-objc-header")
        .arg(&bridging_h)
        .arg("-parse-as-library")
        .arg("-module-name")
        .arg(&config.lib_name)
        .arg("-target")
        .arg(swift_target(&target))
        .arg(&combined_swift);

    let output = swiftc.output().expect("Failed to run swiftc");
    if !output.status.success() {
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        panic!("Swift compilation failed");
    }

    let lib_file = out_dir.join(format!("lib{}.a", config.lib_name));
    let ar_status = Command::new("ar")
        .arg("rcs")
        .arg(&lib_file)
        .arg(&obj_file)
        .status()
        .expect("Failed to run ar");
    assert!(ar_status.success(), "ar failed");

    println!("cargo:rustc-link-search=native={}", out_dir.display());
    println!("cargo:rustc-link-lib=static={}", config.lib_name);

    let swiftc_path = command_stdout(
        Command::new("xcrun").args(["--find", "swiftc"]),
        "xcrun --find swiftc",
    );
    let platform_dir = if target.contains("ios") {
        "iphoneos"
    } else {
        "macosx"
    };
    if let Some(toolchain) = Path::new(&swiftc_path).parent().and_then(Path::parent) {
        let swift_lib = toolchain.join("lib/swift").join(platform_dir);
        println!("cargo:rustc-link-search=native={}", swift_lib.display());
    }

    for framework in &config.frameworks {
        println!("cargo:rustc-link-lib=framework={framework}");
    }
}

fn write_bridging_header(out_dir: &Path, pkg_name: &str) -> PathBuf {
    let core_h = out_dir.join("SwiftBridgeCore.h");
    let pkg_h = out_dir.join(format!("{pkg_name}/{pkg_name}.h"));
    let bridging_h = out_dir.join("Bridging-Header.h");

    let content = format!(
        "#include \"{}\"\n#include \"{}\"\n",
        core_h.display(),
        pkg_h.display()
    );
    fs::write(&bridging_h, content).expect("Failed to write bridging header");
    bridging_h
}

fn write_combined_sources(out_dir: &Path, manifest_dir: &Path, config: &AppleSwiftConfig) -> PathBuf {
    let core_swift = out_dir.join("SwiftBridgeCore.swift");
    let gen_swift = out_dir.join(format!("{0}/{0}.swift", config.pkg_name));
    let combined_swift = out_dir.join(format!("Combined{}.swift", config.lib_name));

    let mut content =
        fs::read_to_string(&core_swift).expect("Failed to read SwiftBridgeCore.swift");
    content.push('\n');
    content.push_str(&fs::read_to_string(&gen_swift).expect("Failed to read generated swift"));

    for source in &config.swift_sources {
        let full_path = manifest_dir.join(source);
        content.push('\n');
        content.push_str(
            &fs::read_to_string(&full_path)
                .unwrap_or_else(|_| panic!("Failed to read {}", full_path.display())),
        );
    }

    fs::write(&combined_swift, content).expect("Failed to write combined Swift file");
    combined_swift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_accumulates() {
        let config = AppleSwiftConfig::new("geokit-state", "Observer")
            .swift_source("src/sys/apple/Observer.swift")
            .framework("CoreLocation");
        assert_eq!(config.swift_sources.len(), 1);
        assert_eq!(config.frameworks, vec!["Foundation", "CoreLocation"]);
    }

    #[test]
    fn swift_target_triples() {
        assert_eq!(swift_target("aarch64-apple-ios"), "arm64-apple-ios14.0");
        assert_eq!(swift_target("aarch64-apple-darwin"), "arm64-apple-macos12.3");
        assert_eq!(swift_target("x86_64-apple-darwin"), "x86_64-apple-macos12.3");
    }
}
