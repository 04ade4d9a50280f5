//! JSONL file store for conversation messages.
//!
//! Each stored message becomes a single JSON line carrying the conversation
//! id, role, content, provider tag and an RFC 3339 `timestamp`. The file is
//! opened in append mode so several runs share one history.

use async_trait::async_trait;
use conclave_application::{ConversationStore, ConversationStoreError};
use conclave_domain::Role;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Record<'a> {
    conversation_id: &'a str,
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<&'a str>,
    timestamp: String,
}

/// Append-only JSONL conversation store.
///
/// Thread-safe via `Mutex<BufWriter<File>>`; every record is flushed as it
/// is written.
pub struct JsonlConversationStore {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlConversationStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConversationStoreError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConversationStoreError::Unavailable(format!("{}: {}", parent.display(), e))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ConversationStoreError::Unavailable(format!("{}: {}", path.display(), e)))?;

        debug!("Conversation store at {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

#[async_trait]
impl ConversationStore for JsonlConversationStore {
    async fn add_message(
        &self,
        conversation_id: &str,
        role: Role,
        content: &str,
        provider_tag: Option<&str>,
    ) -> Result<(), ConversationStoreError> {
        let record = Record {
            conversation_id,
            role: role.as_str(),
            content,
            provider: provider_tag,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| ConversationStoreError::WriteFailed(e.to_string()))?;
        self.append(&line)
            .map_err(|e| ConversationStoreError::WriteFailed(e.to_string()))
    }
}

impl Drop for JsonlConversationStore {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock()
            && let Err(e) = writer.flush()
        {
            warn!("Failed to flush conversation store {}: {}", self.path.display(), e);
        }
    }
}
