//! Content-addressed storage for downloaded PCF documents.
//!
//! The downstream consumer of a discovery result: fetches each accepted URL,
//! re-verifies it actually is a PDF (the discovery heuristic makes no such
//! guarantee), and stores it under a digest-derived filename so repeated runs
//! overwrite rather than duplicate. A `manifest.json` per brand records what
//! was saved.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use url::Url;

use pcfharvest_fetch::PageFetcher;
use pcfharvest_shared::{CandidateLink, HarvestError, Result, is_pdf_url};

/// Digest prefix length used for filenames.
const DIGEST_PREFIX_LEN: usize = 16;

/// Manifest file name within a brand directory.
const MANIFEST_FILE_NAME: &str = "manifest.json";

// ---------------------------------------------------------------------------
// SavedDocument
// ---------------------------------------------------------------------------

/// One document written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedDocument {
    /// Source URL.
    pub url: Url,
    /// Path of the stored file.
    pub file: PathBuf,
    /// Stored size in bytes.
    pub bytes: usize,
    /// Full SHA-256 digest of the content.
    pub sha256: String,
    /// Context text carried over from discovery.
    pub text: String,
    /// When the document was fetched.
    pub fetched_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Filesystem store rooted at one output directory, one subdirectory per
/// brand.
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Create a store rooted at `root`. Directories are created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory documents for `brand` are stored under.
    pub fn brand_dir(&self, brand: &str) -> PathBuf {
        self.root.join(brand.trim().to_ascii_lowercase())
    }

    /// Download one candidate. Returns `Ok(None)` when the candidate was
    /// skipped (HEAD says it is not a PDF) — skipping is not an error.
    pub async fn download<F: PageFetcher>(
        &self,
        fetcher: &F,
        candidate: &CandidateLink,
        brand: &str,
    ) -> Result<Option<SavedDocument>> {
        // Re-verify before persisting: discovery only promises a heuristic.
        if let Some(content_type) = fetcher.content_type(&candidate.url).await {
            let ct = content_type.to_ascii_lowercase();
            if !ct.contains("pdf") && !is_pdf_url(&candidate.url) {
                info!(url = %candidate.url, content_type = %ct, "skipping non-PDF");
                return Ok(None);
            }
        }

        let blob = fetcher.fetch_bytes(&candidate.url).await?;

        let digest = sha256_hex(&blob);
        let dir = self.brand_dir(brand);
        std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

        let file = dir.join(format!("{}.pdf", &digest[..DIGEST_PREFIX_LEN]));
        std::fs::write(&file, &blob).map_err(|e| HarvestError::io(&file, e))?;

        info!(url = %candidate.url, file = %file.display(), bytes = blob.len(), "saved document");

        Ok(Some(SavedDocument {
            url: candidate.url.clone(),
            file,
            bytes: blob.len(),
            sha256: digest,
            text: candidate.text.clone(),
            fetched_at: Utc::now(),
        }))
    }

    /// Download every candidate, skipping failures. Never fails the batch for
    /// one bad URL.
    pub async fn download_all<F: PageFetcher>(
        &self,
        fetcher: &F,
        candidates: &[CandidateLink],
        brand: &str,
    ) -> Vec<SavedDocument> {
        let mut saved = Vec::new();

        for candidate in candidates {
            match self.download(fetcher, candidate, brand).await {
                Ok(Some(doc)) => saved.push(doc),
                Ok(None) => {}
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "download failed");
                }
            }
        }

        saved
    }

    /// Write the brand's `manifest.json` listing the saved documents.
    pub fn write_manifest(&self, brand: &str, saved: &[SavedDocument]) -> Result<PathBuf> {
        let dir = self.brand_dir(brand);
        std::fs::create_dir_all(&dir).map_err(|e| HarvestError::io(&dir, e))?;

        let path = dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(saved)
            .map_err(|e| HarvestError::Storage(format!("manifest serialization: {e}")))?;
        std::fs::write(&path, json).map_err(|e| HarvestError::io(&path, e))?;

        Ok(path)
    }
}

/// Hex SHA-256 of a byte slice.
fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
