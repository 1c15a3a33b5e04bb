//! PV documents: upload validation, storage keys and listing entries.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::constants::ALLOWED_EXTENSIONS;

static RANDOM_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}_").unwrap());

/// A file received from the upload form.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

/// Why a file was left out of an upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    Extension,
    TooLarge { max_mb: u64 },
    Empty,
}

impl fmt::Display for UploadRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Extension => f.write_str("extension non autorisée."),
            Self::TooLarge { max_mb } => write!(f, "dépasse {max_mb} Mo."),
            Self::Empty => f.write_str("fichier vide."),
        }
    }
}

/// Outcome of an upload batch. Per-file failures never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: usize,
    pub paths: Vec<String>,
    pub warnings: Vec<String>,
}

impl UploadReport {
    pub fn warn(&mut self, file_name: &str, reason: impl fmt::Display) {
        self.warnings.push(format!("{file_name}: {reason}"));
    }
}

/// A document found in the bucket for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Object name as stored (with its random prefix).
    pub file_name: String,
    /// Object name without the random prefix.
    pub display_name: String,
    /// Full object key inside the bucket.
    pub path: String,
    pub url: Option<String>,
    pub uploaded_at: Option<String>,
}

/// Lowercased extension including the dot, if any.
#[must_use]
pub fn file_extension(name: &str) -> Option<String> {
    let base = base_name(name);
    let idx = base.rfind('.')?;
    if idx == 0 {
        return None;
    }
    base.get(idx..).map(str::to_ascii_lowercase)
}

#[must_use]
pub fn allowed_extension(name: &str) -> bool {
    file_extension(name).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Extension allow-list first, then emptiness, then the size ceiling (`max_mb` MiB).
pub fn check_upload(file: &UploadFile, max_mb: u64) -> Result<(), UploadRejection> {
    if !allowed_extension(&file.name) {
        return Err(UploadRejection::Extension);
    }
    if file.bytes.is_empty() {
        return Err(UploadRejection::Empty);
    }
    if file.bytes.len() as u64 > max_mb.saturating_mul(1024 * 1024) {
        return Err(UploadRejection::TooLarge { max_mb });
    }
    Ok(())
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Fold accents, replace anything outside `[A-Za-z0-9._-]` with `_` and collapse runs of `_`.
fn clean_component(raw: &str) -> String {
    let folded: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let mut out = String::with_capacity(folded.len());
    for c in folded.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Make a client-supplied file name safe to use inside a storage key.
///
/// The stem and the extension are cleaned apart so the extension survives a stem
/// made only of non-Latin characters (`Протокол.pdf` → `document.pdf`).
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = base_name(name.trim());
    let extension = file_extension(base)
        .map(|ext| ext.chars().filter(char::is_ascii_alphanumeric).collect::<String>())
        .filter(|ext| !ext.is_empty());
    let stem = match &extension {
        Some(_) => base.rfind('.').and_then(|idx| base.get(..idx)).unwrap_or(base),
        None => base,
    };

    let cleaned = clean_component(stem);
    let trimmed = cleaned.trim_start_matches(['.', '_']).trim_end_matches(['.', '_']);
    let stem = if trimmed.chars().any(|c| c.is_ascii_alphanumeric()) { trimmed } else { "document" };

    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_owned(),
    }
}

/// Folder holding every document of a project.
#[must_use]
pub fn project_folder(project_id: &str) -> String {
    format!("{project_id}/")
}

/// Object key `{project_id}/{YYYYMMDD}/{random}_{filename}`.
#[must_use]
pub fn storage_key(project_id: &str, day: NaiveDate, random: &str, file_name: &str) -> String {
    format!("{project_id}/{}/{random}_{}", day.format("%Y%m%d"), sanitize_filename(file_name))
}

/// Object name without the 32-hex random prefix added at upload.
#[must_use]
pub fn display_name(object_name: &str) -> String {
    let base = base_name(object_name);
    RANDOM_PREFIX_REGEX.replace(base, "").into_owned()
}

/// Most recent first; entries without a timestamp go last.
pub fn sort_newest_first(documents: &mut [StoredDocument]) {
    documents.sort_by(|a, b| {
        let a = a.uploaded_at.as_deref().unwrap_or("");
        let b = b.uploaded_at.as_deref().unwrap_or("");
        b.cmp(a)
    });
}
