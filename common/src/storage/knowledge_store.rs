use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::{error::AppError, storage::types::knowledge_entry::KnowledgeEntry};

enum KnowledgeSource {
    File(PathBuf),
    Inline,
}

/// Read-once holder of the profile knowledge base.
///
/// The first call to [`KnowledgeStore::load`] reads and parses the bundled
/// JSON file. Whatever that produced, including an empty base after a read or
/// parse failure, is returned by every later call without touching the file
/// again.
pub struct KnowledgeStore {
    source: KnowledgeSource,
    entries: OnceCell<Arc<[KnowledgeEntry]>>,
}

impl KnowledgeStore {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: KnowledgeSource::File(path.into()),
            entries: OnceCell::new(),
        }
    }

    pub fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            source: KnowledgeSource::Inline,
            entries: OnceCell::new_with(Some(entries.into())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            KnowledgeSource::File(path) => Some(path.as_path()),
            KnowledgeSource::Inline => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entries.initialized()
    }

    pub async fn load(&self) -> Arc<[KnowledgeEntry]> {
        let entries = self
            .entries
            .get_or_init(|| async {
                match self.read_entries().await {
                    Ok(entries) => {
                        info!(entries = entries.len(), "Loaded knowledge base entries");
                        entries.into()
                    }
                    Err(err) => {
                        error!(
                            path = ?self.path(),
                            error = %err,
                            "Failed to load knowledge base; continuing without it"
                        );
                        Arc::from(Vec::new())
                    }
                }
            })
            .await;

        Arc::clone(entries)
    }

    async fn read_entries(&self) -> Result<Vec<KnowledgeEntry>, AppError> {
        let KnowledgeSource::File(path) = &self.source else {
            return Ok(Vec::new());
        };

        let raw = tokio::fs::read_to_string(path).await?;
        let entries = serde_json::from_str::<Vec<KnowledgeEntry>>(&raw)?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_knowledge_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn loads_entries_from_json_file() {
        let file = write_knowledge_file(
            r#"[
                {"topic": "Current role", "content": "Senior BI Product Manager"},
                {"topic": "Education", "content": "PhD", "source": "cv"}
            ]"#,
        );
        let store = KnowledgeStore::from_path(file.path());

        let entries = store.load().await;

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.first(),
            Some(&KnowledgeEntry::new(
                "Current role",
                "Senior BI Product Manager"
            ))
        );
        assert!(store.is_loaded());
    }

    #[tokio::test]
    async fn missing_file_yields_empty_base() {
        let dir = tempfile::tempdir().unwrap();
        let store = KnowledgeStore::from_path(dir.path().join("absent.json"));

        let entries = store.load().await;

        assert!(entries.is_empty());
        assert!(store.is_loaded());
    }

    #[tokio::test]
    async fn malformed_json_yields_empty_base() {
        let file = write_knowledge_file(r#"[{"topic": "Skills"}]"#);
        let store = KnowledgeStore::from_path(file.path());

        assert!(store.load().await.is_empty());

        let file = write_knowledge_file("not json at all");
        let store = KnowledgeStore::from_path(file.path());

        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn result_is_cached_after_first_read() {
        let file = write_knowledge_file(r#"[{"topic": "Skills", "content": "SQL"}]"#);
        let path = file.path().to_path_buf();
        let store = KnowledgeStore::from_path(&path);

        assert_eq!(store.load().await.len(), 1);

        drop(file);
        assert!(!path.exists());

        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn inline_entries_are_ready_immediately() {
        let store = KnowledgeStore::from_entries(vec![KnowledgeEntry::new("Skills", "Python")]);

        assert!(store.is_loaded());
        assert!(store.path().is_none());
        assert_eq!(store.load().await.len(), 1);
    }
}
