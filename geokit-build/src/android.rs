//! Android build utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locate `android.jar` for the configured SDK platform.
#[must_use]
pub fn find_android_jar() -> Option<PathBuf> {
    android_build::android_jar(None)
}

/// Locate `d8.jar` from the configured SDK build tools.
#[must_use]
pub fn find_d8_jar() -> Option<PathBuf> {
    android_build::android_d8_jar(None)
}

fn collect_class_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", dir.display()));
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_class_files(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "class") {
            out.push(path);
        }
    }
}

/// Compile Kotlin sources to `classes.dex` in `OUT_DIR`.
///
/// The crate embeds the result with
/// `include_bytes!(concat!(env!("OUT_DIR"), "/classes.dex"))`.
/// Does nothing unless the build targets Android.
///
/// # Arguments
/// * `sources` - Kotlin files relative to the crate manifest
pub fn build_kotlin(sources: &[&str]) {
    for source in sources {
        println!("cargo:rerun-if-changed={source}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("android") {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));

    let android_jar = find_android_jar().expect("Failed to find android.jar");

    // Compile .kt -> .class using kotlinc
    let classes_dir = out_dir.join("classes");
    fs::create_dir_all(&classes_dir).expect("Failed to create classes directory");

    let mut kotlinc = Command::new("kotlinc");
    kotlinc
        .arg("-classpath")
        .arg(&android_jar)
        .arg("-d")
        .arg(&classes_dir);
    for source in sources {
        kotlinc.arg(manifest_dir.join(source));
    }

    let status = kotlinc
        .status()
        .expect("Failed to run kotlinc - is Kotlin compiler installed?");
    assert!(status.success(), "kotlinc compilation failed");

    let mut class_files = Vec::new();
    collect_class_files(&classes_dir, &mut class_files);
    assert!(!class_files.is_empty(), "kotlinc produced no class files");

    let d8_jar = find_d8_jar().expect("Failed to find d8.jar");

    // Convert .class -> .dex using D8
    let mut d8 = android_build::JavaRun::new();
    d8.class_path(d8_jar)
        .main_class("com.android.tools.r8.D8")
        .arg("--classpath")
        .arg(&android_jar)
        .arg("--output")
        .arg(&out_dir);
    for class_file in &class_files {
        d8.arg(class_file);
    }

    assert!(
        d8.run()
            .expect("failed to acquire exit status for java d8.jar invocation")
            .success(),
        "D8 dexing failed"
    );
}
