//! Structural tests for layer boundaries.
//!
//! These tests scan source files to verify that the domain, application and
//! infrastructure layers only import what they are allowed to.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

/// Lines under `src/<layer>` that contain any of `forbidden`.
fn violations(layer: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    let mut found = Vec::new();
    for file in collect_rs_files(&root.join(layer)) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            for pattern in forbidden {
                if line.contains(pattern) {
                    found.push(format!("{rel}:{}: `{pattern}`: {line}", i + 1));
                }
            }
        }
    }
    found
}

#[test]
fn domain_is_free_of_io_and_outer_layers() {
    let found = violations(
        "domain",
        &[
            "crate::infra",
            "crate::application",
            "crate::commands",
            "crate::output",
            "tokio::",
            "reqwest",
            "std::fs",
            "std::net",
        ],
    );
    assert!(found.is_empty(), "domain/ must stay pure:\n{}", found.join("\n"));
}

#[test]
fn application_depends_only_on_domain_and_ports() {
    let found = violations(
        "application",
        &["crate::infra", "crate::commands", "crate::output", "reqwest"],
    );
    assert!(
        found.is_empty(),
        "application/ must not import infra, commands or output:\n{}",
        found.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands_or_output() {
    let found = violations(
        "infra",
        &["crate::commands", "crate::output", "println!", "eprintln!"],
    );
    assert!(
        found.is_empty(),
        "infra/ must not import from commands/ or output/, nor print:\n{}",
        found.join("\n")
    );
}
