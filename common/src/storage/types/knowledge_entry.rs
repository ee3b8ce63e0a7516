use serde::{Deserialize, Serialize};

/// A single fact about the profile owner.
///
/// The bundled knowledge file may carry additional fields per entry; only
/// `topic` and `content` are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub topic: String,
    pub content: String,
}

impl KnowledgeEntry {
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
        }
    }

    /// Text sent to the embedding model for this entry.
    pub fn embedding_text(&self) -> String {
        format!("{}: {}", self.topic, self.content)
    }

    /// Bullet line used when injecting the entry into a prompt.
    pub fn as_context_line(&self) -> String {
        format!("- {}: {}", self.topic, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_embedding_text_and_context_line() {
        let entry = KnowledgeEntry::new("Education", "PhD, Ecole des Mines de Paris");

        assert_eq!(
            entry.embedding_text(),
            "Education: PhD, Ecole des Mines de Paris"
        );
        assert_eq!(
            entry.as_context_line(),
            "- Education: PhD, Ecole des Mines de Paris"
        );
    }

    #[test]
    fn ignores_unknown_fields_when_deserializing() {
        let entry: KnowledgeEntry = serde_json::from_str(
            r#"{"topic": "Languages", "content": "French, English", "tags": ["lang"]}"#,
        )
        .unwrap();

        assert_eq!(entry, KnowledgeEntry::new("Languages", "French, English"));
    }
}
