//! Shared constants for the chantier tracker.

/// Storage bucket holding the PV documents.
pub const DEFAULT_BUCKET: &str = "pv-chantier";

/// Upload ceiling per file, in MiB.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 25;

/// Lifetime of generated signed URLs, in seconds.
pub const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;

/// Accepted document extensions (lowercase, with leading dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".doc"];

/// Value of the `accept` attribute on the upload input.
pub const UPLOAD_ACCEPT: &str = ".pdf,.docx,.doc";

/// Table receiving one row per progress update.
pub const PROJECT_UPDATES_TABLE: &str = "project_updates";

/// Table listing the selectable projects.
pub const PROJECTS_TABLE: &str = "projects";

/// Default name of the auxiliary upload log table, when enabled without a name.
pub const DEFAULT_PV_LOG_TABLE: &str = "pv_files";

/// Content type sent with every storage upload.
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Maximum folder depth walked when listing a project's documents.
pub const MAX_LISTING_DEPTH: usize = 4;

/// Page size requested from the storage list endpoint.
pub const STORAGE_LIST_LIMIT: usize = 1000;

/// Lower and upper bound of the percentage fields.
pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;
