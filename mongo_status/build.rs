use std::env;
use std::path::PathBuf;

/// Exposes the locked TLS and driver versions to the report
fn main() {
    let manifest = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
    let lock = manifest.join("..").join("Cargo.lock");
    println!("cargo:rerun-if-changed={}", lock.display());

    let text = std::fs::read_to_string(&lock).unwrap_or_default();
    println!(
        "cargo:rustc-env=MONGO_STATUS_RUSTLS_VERSION={}",
        locked_versions(&text, "rustls")
    );
    println!(
        "cargo:rustc-env=MONGO_STATUS_DRIVER_VERSION={}",
        locked_versions(&text, "mongodb")
    );
}

fn locked_versions(lock: &str, name: &str) -> String {
    let wanted = format!("name = \"{}\"", name);
    let mut versions = Vec::new();
    let mut lines = lock.lines();
    while let Some(line) = lines.next() {
        if line.trim() != wanted {
            continue;
        }
        if let Some(v) = lines
            .next()
            .and_then(|l| l.trim().strip_prefix("version = \""))
        {
            versions.push(v.trim_end_matches('"').to_string());
        }
    }
    if versions.is_empty() {
        "unknown".to_string()
    } else {
        versions.join(", ")
    }
}
