//! `validate` command: run both file checks on local files.

use std::path::Path;

use anyhow::{Context, Result};
use finsight_core::validation::{
    ContentSafetyVerdict, ValidationVerdict, check_file_content, validate_file,
};
use serde::Serialize;

use crate::ProcessExit;
use crate::cli::ValidateArgs;

/// One JSON line per file.
#[derive(Debug, Serialize)]
struct FileReport<'a> {
    file: &'a Path,
    validation: ValidationVerdict,
    content: ContentSafetyVerdict,
}

fn inspect<'a>(path: &'a Path, bytes: &[u8]) -> FileReport<'a> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    FileReport {
        file: path,
        validation: validate_file(bytes, &filename),
        content: check_file_content(bytes),
    }
}

/// Prints a report per file; fails when any file is invalid.
pub async fn run_validate_command(args: &ValidateArgs) -> Result<ProcessExit> {
    let mut all_valid = true;
    for path in &args.files {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read '{}'", path.display()))?;
        let report = inspect(path, &bytes);
        all_valid &= report.validation.valid;
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(if all_valid {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    })
}
