//! Build script for afs-bindings crate.
//!
//! Links the system frameworks backing the native entry points when building
//! for an Apple target. Other targets build the safe layer only and expect a
//! caller-supplied backend implementing the `ffi` traits.

use std::env;

/// Frameworks providing the native entry points used by `ffi::system`.
const FRAMEWORKS: &[&str] = &["AudioToolbox", "CoreLocation", "Foundation"];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Use the *target* OS, not cfg!(target_os), so cross builds link correctly
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if !is_apple(&target_os) {
        return;
    }

    for framework in FRAMEWORKS {
        println!("cargo:rustc-link-lib=framework={}", framework);
    }

    // objc_msgSend and friends for the Foundation array helpers
    println!("cargo:rustc-link-lib=objc");
}

/// Check if the target OS ships the Apple frameworks.
fn is_apple(target_os: &str) -> bool {
    matches!(target_os, "macos" | "ios" | "tvos" | "watchos" | "visionos")
}
