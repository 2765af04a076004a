//! Document ingestion.
//!
//! `DocumentIngestor` turns a list of source paths into `DocumentUnit`s,
//! reading them concurrently through a `DocumentReader`. A path that cannot
//! be read still yields a unit, marked failed, so the run can report it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use claimfill_contracts::{
    document::{DocumentId, DocumentUnit},
    error::{ClaimfillError, ClaimfillResult},
};

use crate::{fanout::ordered, narrative, traits::DocumentReader};

/// Reads UTF-8 text and markdown files from disk.
///
/// Binary formats (PDF, images) are out of scope; plug in a reader that
/// extracts their text upstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsTextReader;

#[async_trait]
impl DocumentReader for FsTextReader {
    async fn read(&self, path: &Path) -> ClaimfillResult<String> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| ClaimfillError::Ingestion {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(clean_markdown(&text))
    }
}

/// Tidy extracted markdown for model consumption.
///
/// Drops `-----` page rules and turns bold lines into `###` headers with
/// emphasis markers removed.
pub fn clean_markdown(text: &str) -> String {
    text.lines()
        .filter(|line| *line != "-----")
        .map(|line| {
            if line.starts_with("**") {
                format!("### {}", line.replace(['*', '_'], ""))
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Consecutive id collisions tolerated before ids are widened.
const MAX_COLLISIONS: usize = 16;
/// Hex characters in a full v4 UUID.
const MAX_ID_LENGTH: usize = 32;

pub struct DocumentIngestor {
    reader: Arc<dyn DocumentReader>,
    id_length: usize,
    max_concurrency: usize,
    narrative_sentinel: String,
}

impl DocumentIngestor {
    pub fn new(
        reader: Arc<dyn DocumentReader>,
        id_length: usize,
        max_concurrency: usize,
        narrative_sentinel: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            id_length,
            max_concurrency: max_concurrency.max(1),
            narrative_sentinel: narrative_sentinel.into(),
        }
    }

    /// Read every path, preserving input order.
    ///
    /// The narrative file, if present, is normalised to markdown.
    pub async fn ingest(&self, paths: &[PathBuf]) -> Vec<DocumentUnit> {
        self.ingest_case(None, paths).await
    }

    /// Read every path and, when given, append the narrative the user typed
    /// as a last unit named after the sentinel.
    ///
    /// Every id, the narrative's included, comes from one batch and is
    /// distinct within it.
    pub async fn ingest_case(&self, typed_narrative: Option<&str>, paths: &[PathBuf]) -> Vec<DocumentUnit> {
        let mut ids = self.unique_ids(paths.len() + usize::from(typed_narrative.is_some()));
        let narrative_id = typed_narrative.and_then(|_| ids.pop());

        let jobs = paths.iter().cloned().zip(ids).map(|(path, id)| async move {
            match self.reader.read(&path).await {
                Ok(text) => {
                    let text = if is_sentinel(&path, &self.narrative_sentinel) {
                        narrative::to_markdown(&text)
                    } else {
                        text
                    };
                    debug!(document_id = %id, path = %path.display(), chars = text.len(), "document ingested");
                    DocumentUnit::ingested(id, path, text)
                }
                Err(e) => {
                    warn!(document_id = %id, path = %path.display(), error = %e, "document ingestion failed");
                    DocumentUnit::failed(id, path, e.to_string())
                }
            }
        });
        let mut units = ordered(jobs, self.max_concurrency).await;

        if let (Some(text), Some(id)) = (typed_narrative, narrative_id) {
            units.push(DocumentUnit::ingested(
                id,
                PathBuf::from(&self.narrative_sentinel),
                narrative::to_markdown(text),
            ));
        }
        units
    }

    /// `count` ids, distinct within this batch.
    ///
    /// After `MAX_COLLISIONS` draws in a row hit ids already taken, the id
    /// grows by one character, so a batch larger than the configured id
    /// space still completes.
    fn unique_ids(&self, count: usize) -> Vec<DocumentId> {
        let mut len = self.id_length;
        let mut seen = HashSet::with_capacity(count);
        let mut ids = Vec::with_capacity(count);
        let mut collisions = 0;
        while ids.len() < count {
            let id = DocumentId::generate(len);
            if seen.insert(id.clone()) {
                ids.push(id);
                collisions = 0;
                continue;
            }
            collisions += 1;
            if collisions >= MAX_COLLISIONS && len < MAX_ID_LENGTH {
                len += 1;
                collisions = 0;
                warn!(id_length = len, batch = count, "document id space exhausted, widening ids");
            }
        }
        ids
    }
}

fn is_sentinel(path: &Path, sentinel: &str) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(sentinel)
}
