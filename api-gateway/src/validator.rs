// ==============================================================================
// validator.rs - Upload Validation (API Gateway)
// ==============================================================================
// Description: Validates uploaded batch files before they reach the parser
// Author: Matt Barham
// Created: 2025-11-26
// Modified: 2026-10-18
// Version: 1.1.0
// Security: Size limits, sanitized names in logs, SHA-256 audit digest
// ==============================================================================

use axum::body::Bytes;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];
const MAX_FILENAME_LEN: usize = 255;

#[derive(Error, Debug, PartialEq)]
pub enum UploadError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("Could not read uploaded file: {0}")]
    Read(String),
}

/// How the batch should be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Tsv,
}

impl UploadFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            UploadFormat::Csv => b',',
            UploadFormat::Tsv => b'\t',
        }
    }
}

#[derive(Debug)]
pub struct ValidatedUpload {
    pub safe_name: String,
    pub size: usize,
    pub hash_sha256: String,
    pub gzipped: bool,
    pub format: UploadFormat,
}

impl ValidatedUpload {
    /// Digest prefix for log lines
    pub fn short_hash(&self) -> &str {
        &self.hash_sha256[..16]
    }
}

#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_size: usize,
}

impl UploadValidator {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Validate one uploaded file from the multipart form
    pub fn validate(&self, filename: &str, data: &Bytes) -> Result<ValidatedUpload, UploadError> {
        // 1. Size check (BEFORE any processing)
        // Empty files pass through so the parser reports them like any unreadable CSV
        let size = data.len();
        if size > self.max_size {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_size,
            });
        }
        debug!(size, "Size check passed");

        // 2. Filename sanitization (names only ever reach the logs)
        let safe_name = sanitize_filename(filename);

        // 3. Format detection
        let gzipped = data.starts_with(&GZIP_MAGIC);
        let format = detect_format(&safe_name);

        // 4. Compute SHA-256 hash
        let hash_sha256 = compute_sha256(data);
        debug!(sha256 = %hash_sha256, "Digest computed");

        Ok(ValidatedUpload {
            safe_name,
            size,
            hash_sha256,
            gzipped,
            format,
        })
    }
}

fn sanitize_filename(name: &str) -> String {
    // Remove path separators, null bytes, control characters
    let safe: String = name
        .replace(['/', '\\', '\0'], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .take(MAX_FILENAME_LEN)
        .collect();

    let safe = safe.trim_start_matches('.');
    if safe.is_empty() {
        "upload.csv".to_string()
    } else {
        safe.to_string()
    }
}

fn detect_format(safe_name: &str) -> UploadFormat {
    let lower = safe_name.to_lowercase();
    if lower.ends_with(".tsv") || lower.ends_with(".tsv.gz") {
        UploadFormat::Tsv
    } else {
        UploadFormat::Csv
    }
}

fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
