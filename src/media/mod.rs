/// Photo input/output module
///
/// This module handles:
/// - Reading and validating user-selected photos (ingest.rs)
/// - Downloading generated results (export.rs)

pub mod export;
pub mod ingest;
