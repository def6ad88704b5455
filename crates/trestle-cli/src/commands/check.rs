// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! `trestle check`: report syntax errors in device-tree sources.
//!
//! Every macro invocation is parsed as well, so a malformed argument list
//! is reported even though the surrounding file is fine. Exits non-zero if
//! any file has an error.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use tracing::{debug, info};
use trestle_core::dts;
use trestle_core::engine::ParseOptions;
use trestle_core::source_analysis::Diagnostic;

use super::parse::embedded_diagnostics;
use super::{read_source, report};

/// File extensions treated as device-tree source.
const EXTENSIONS: [&str; 3] = ["dts", "dtsi", "overlay"];

pub fn run(paths: &[Utf8PathBuf], options: &ParseOptions) -> Result<()> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(collect_files(path)?);
    }
    if files.is_empty() {
        miette::bail!("No device-tree source files found");
    }

    let mut failed = 0usize;
    for file in &files {
        let source = read_source(file)?;
        let diagnostics = check_file(&source, options)?;
        debug!(%file, diagnostics = diagnostics.len(), "checked file");
        if diagnostics.iter().any(Diagnostic::is_error) {
            failed += 1;
        }
        report(&diagnostics, file, &source);
    }

    let checked = files.len();
    if failed > 0 {
        miette::bail!("{failed} of {checked} file(s) have syntax errors");
    }
    info!(files = checked, "check passed");
    println!("Checked {checked} file(s): no syntax errors");
    Ok(())
}

/// Parses one source and its macros, returning every diagnostic in
/// source order.
pub fn check_file(source: &str, options: &ParseOptions) -> Result<Vec<Diagnostic>> {
    let parse = dts::parse_with(source, options, None)?;
    let mut diagnostics = parse.diagnostics().to_vec();
    diagnostics.extend(embedded_diagnostics(parse.root()));
    diagnostics.sort_by_key(|d| (d.span.start(), d.span.end()));
    Ok(diagnostics)
}

fn is_source_file(path: &Utf8Path) -> bool {
    path.extension().is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Expands `path` into the source files to check, sorted for stable output.
fn collect_files(path: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    if path.is_file() {
        if !is_source_file(path) {
            miette::bail!("File '{path}' is not a device-tree source file");
        }
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        miette::bail!("Path '{path}' does not exist");
    }
    let mut files = Vec::new();
    collect_recursive(path, &mut files)?;
    files.sort();
    Ok(files)
}

/// Symlinks are skipped so that circular links cannot recurse forever.
fn collect_recursive(dir: &Utf8Path, files: &mut Vec<Utf8PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        let file_type = entry.file_type().into_diagnostic()?;
        if file_type.is_symlink() {
            continue;
        }
        let entry_path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|_| miette::miette!("Non-UTF-8 path"))?;

        if file_type.is_dir() {
            collect_recursive(&entry_path, files)?;
        } else if file_type.is_file() && is_source_file(&entry_path) {
            files.push(entry_path);
        }
    }
    Ok(())
}
