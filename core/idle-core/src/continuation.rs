//! Continuation ingestion.
//!
//! On every Idle transition the continuation folder is scanned for queued
//! instruction files (`*.txt`). Their contents are stitched into one prompt
//! for the session driver.
//!
//! ## Rules
//!
//! - Missing folder: create it, drop a usage note, compose nothing (first run)
//! - Files are read in filename order; unreadable files are logged and skipped
//! - Whitespace-only files are skipped
//! - Nothing is deleted or rewritten, so identical contents compose identical prompts

use crate::error::{IdleError, Result};
use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CONTINUATION_EXTENSION: &str = "txt";

/// Not a `.txt` file, so it is never picked up as an instruction.
pub const USAGE_NOTE_NAME: &str = "README.md";

const USAGE_NOTE: &str = "# Continuation folder

Drop plain-text files ending in `.txt` into this folder.

When the assistant session has been idle for the configured timeout, every
non-empty `.txt` file here is read in filename order and sent as one
continuation prompt. Files are left in place: remove or edit them once the
work they describe is done, or the same prompt is sent again on the next idle.

Prefix names with numbers (`01-tests.txt`, `02-docs.txt`) to control order.
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationResource {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedPrompt {
    pub text: String,
    /// File names in the order they were composed.
    pub sources: Vec<String>,
    /// Idle cycle this prompt was composed for.
    pub cycle: u64,
    pub composed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Folder was missing and has been created with a usage note.
    Bootstrapped { folder: PathBuf },
    /// Folder exists but held nothing usable.
    Empty,
    Composed(ComposedPrompt),
}

/// Resolves the configured folder against the workspace root.
pub fn resolve_folder(folder: &Path, workspace_root: Option<&Path>) -> Result<PathBuf> {
    if folder.is_absolute() {
        return Ok(folder.to_path_buf());
    }
    workspace_root
        .map(|root| root.join(folder))
        .ok_or_else(|| IdleError::NoWorkspaceRoot(folder.to_path_buf()))
}

#[derive(Debug, Clone, Default)]
pub struct ContinuationIngester;

impl ContinuationIngester {
    pub fn new() -> Self {
        Self
    }

    /// One ingestion pass. Per-file failures are absorbed; only failures that
    /// prevent the pass as a whole (resolution, creation, listing) are returned.
    pub fn ingest(
        &self,
        folder: &Path,
        workspace_root: Option<&Path>,
        cycle: u64,
    ) -> Result<IngestOutcome> {
        let folder = resolve_folder(folder, workspace_root)?;

        if !folder.exists() {
            bootstrap_folder(&folder)?;
            tracing::info!(folder = %folder.display(), "Created continuation folder");
            return Ok(IngestOutcome::Bootstrapped { folder });
        }

        let resources = read_resources(&folder)?;
        match compose(&resources, cycle) {
            Some(prompt) => {
                tracing::info!(
                    folder = %folder.display(),
                    sources = prompt.sources.len(),
                    cycle,
                    "Composed continuation prompt"
                );
                Ok(IngestOutcome::Composed(prompt))
            }
            None => {
                tracing::debug!(folder = %folder.display(), "No continuation instructions queued");
                Ok(IngestOutcome::Empty)
            }
        }
    }
}

fn bootstrap_folder(folder: &Path) -> Result<()> {
    fs::create_dir_all(folder).map_err(|source| IdleError::Io {
        context: format!("creating {}", folder.display()),
        source,
    })?;
    let note = folder.join(USAGE_NOTE_NAME);
    fs::write(&note, USAGE_NOTE).map_err(|source| IdleError::Io {
        context: format!("writing {}", note.display()),
        source,
    })
}

fn is_instruction_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(CONTINUATION_EXTENSION))
            .unwrap_or(false)
}

/// Lists, sorts and reads instruction files, skipping unreadable and blank ones.
pub fn read_resources(folder: &Path) -> Result<Vec<ContinuationResource>> {
    let entries = fs::read_dir(folder).map_err(|source| IdleError::Io {
        context: format!("listing {}", folder.display()),
        source,
    })?;

    let mut paths: Vec<(String, PathBuf)> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                tracing::warn!(error = %err, folder = %folder.display(), "Skipping unreadable entry");
                None
            }
        })
        .filter(|path| is_instruction_file(path))
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            Some((name, path))
        })
        .collect();
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    let mut resources = Vec::with_capacity(paths.len());
    for (name, path) in paths {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "Skipping unreadable instruction file");
                continue;
            }
        };
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Skipping empty instruction file");
            continue;
        }
        resources.push(ContinuationResource { name, content });
    }

    Ok(resources)
}

/// Joins resources into one prompt, each under a header naming its file.
pub fn compose(resources: &[ContinuationResource], cycle: u64) -> Option<ComposedPrompt> {
    let sections: Vec<String> = resources
        .iter()
        .filter(|resource| !resource.content.trim().is_empty())
        .map(|resource| format!("## {}\n{}", resource.name, resource.content.trim_end()))
        .collect();

    if sections.is_empty() {
        return None;
    }

    Some(ComposedPrompt {
        text: sections.join("\n\n"),
        sources: resources
            .iter()
            .filter(|resource| !resource.content.trim().is_empty())
            .map(|resource| resource.name.clone())
            .collect(),
        cycle,
        composed_at: Utc::now(),
    })
}
