//! CLI utility functions.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub fn format_bytes(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const KB_TO_MB_ROUNDING_THRESHOLD: usize = 1_048_525;

    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < KB_TO_MB_ROUNDING_THRESHOLD {
        format!("{:.1} KB", bytes as f64 / KB)
    } else {
        format!("{:.2} MB", bytes as f64 / MB)
    }
}

/// Cyan spinner on stderr, ticking until finished.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.into());
    spinner
}

/// Read a whole input file behind a spinner.
pub fn read_input(path: &Path, what: &str) -> Result<Vec<u8>> {
    let spinner = spinner(format!("Reading {} {}", what, style(path.display()).cyan()));
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to open {}: {}", what, path.display()));
    match data {
        Ok(data) => {
            spinner.finish_with_message(format!(
                "[OK] Read {} ({})",
                what,
                style(format_bytes(data.len())).cyan()
            ));
            Ok(data)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Err(e)
        }
    }
}

/// `<dir>/<stem>_certified.pdf` next to the input PDF.
pub fn default_certified_output_path(input: &Path) -> Result<PathBuf> {
    let mut p = input.to_path_buf();
    let stem = p
        .file_stem()
        .context("Input path must include a file name (cannot derive default output path)")?;
    let mut name: OsString = stem.to_os_string();
    name.push("_certified.pdf");
    p.set_file_name(name);
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_displays_1024_kb_due_to_rounding() {
        for bytes in 1_048_560..1_048_576 {
            let s = format_bytes(bytes);
            assert!(
                !s.contains("KB") || !s.contains("1024.0"),
                "unexpected formatting for {bytes}: {s}"
            );
        }
    }

    #[test]
    fn small_sizes_are_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }

    #[test]
    fn certified_path_replaces_extension() {
        let out = default_certified_output_path(Path::new("/tmp/diploma.pdf")).unwrap();
        assert_eq!(out, PathBuf::from("/tmp/diploma_certified.pdf"));
    }

    #[test]
    fn certified_path_without_extension() {
        let out = default_certified_output_path(Path::new("certs/alice")).unwrap();
        assert_eq!(out, PathBuf::from("certs/alice_certified.pdf"));
    }

    #[test]
    fn certified_path_root_has_no_filename() {
        let err = default_certified_output_path(Path::new("/")).unwrap_err();
        assert!(
            err.to_string().contains("cannot derive default output path"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn read_input_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("absent.pdf"), "certificate").unwrap_err();
        assert!(err.to_string().contains("Failed to open certificate"));
    }
}
