//! Conversation memory and score persistence
//!
//! Records are kept either in process memory or appended as JSON lines to a
//! file, selected by a [`StorageUrl`] (`:memory:` or `file:<path>`).

use std::{
    collections::VecDeque,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{
    fs,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::Mutex,
};
use tracing::debug;

use crate::model::{ChatMessage, ChatRole};

/// Errors raised by a [`MemoryStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid storage url '{0}': expected ':memory:' or 'file:<path>'")]
    InvalidUrl(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Location of a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUrl {
    InMemory,
    File(PathBuf),
}

impl FromStr for StorageUrl {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ":memory:" {
            return Ok(Self::InMemory);
        }
        match s.strip_prefix("file:") {
            Some(path) if !path.is_empty() => Ok(Self::File(PathBuf::from(path))),
            _ => Err(StoreError::InvalidUrl(s.to_string())),
        }
    }
}

impl fmt::Display for StorageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InMemory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// A message remembered for a conversation thread
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub thread_id: String,
    pub message: ChatMessage,
    pub created_at: DateTime<Utc>,
}

/// The outcome of one scorer run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub run_id: String,
    pub agent_id: String,
    pub scorer: String,
    pub score: f64,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Record {
    Message(MessageRecord),
    Score(ScoreRecord),
}

#[derive(Debug, Default)]
struct Records {
    messages: Vec<MessageRecord>,
    scores: Vec<ScoreRecord>,
}

#[derive(Debug)]
enum Backend {
    InMemory(Mutex<Records>),
    File { path: PathBuf, lock: Mutex<()> },
}

/// Store for thread messages and score records
#[derive(Debug)]
pub struct MemoryStore {
    url: StorageUrl,
    backend: Backend,
}

impl MemoryStore {
    pub fn in_memory() -> Self {
        Self::open(StorageUrl::InMemory)
    }

    /// Open a store; file stores are created lazily on first write
    pub fn open(url: StorageUrl) -> Self {
        let backend = match &url {
            StorageUrl::InMemory => Backend::InMemory(Mutex::new(Records::default())),
            StorageUrl::File(path) => Backend::File {
                path: path.clone(),
                lock: Mutex::new(()),
            },
        };
        Self { url, backend }
    }

    pub fn url(&self) -> &StorageUrl {
        &self.url
    }

    /// Remember `messages` under `thread_id`
    pub async fn append_messages(&self, thread_id: &str, messages: &[ChatMessage]) -> Result<(), StoreError> {
        if messages.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let records = messages.iter().map(|message| MessageRecord {
            thread_id: thread_id.to_string(),
            message: message.clone(),
            created_at: now,
        });

        match &self.backend {
            Backend::InMemory(state) => state.lock().await.messages.extend(records),
            Backend::File { path, lock } => {
                let _guard = lock.lock().await;
                append_lines(path, records.map(Record::Message)).await?;
            }
        }
        debug!(thread_id, count = messages.len(), "stored messages");
        Ok(())
    }

    /// The last `limit` messages of `thread_id`, oldest first.
    ///
    /// The window never opens on a tool reply: replies whose assistant
    /// tool call fell outside it are dropped.
    pub async fn recall(&self, thread_id: &str, limit: usize) -> Result<Vec<ChatMessage>, StoreError> {
        let mut window = VecDeque::with_capacity(limit);
        let mut push = |message: ChatMessage| {
            if limit == 0 {
                return;
            }
            if window.len() == limit {
                window.pop_front();
            }
            window.push_back(message);
        };

        match &self.backend {
            Backend::InMemory(state) => state
                .lock()
                .await
                .messages
                .iter()
                .filter(|record| record.thread_id == thread_id)
                .for_each(|record| push(record.message.clone())),
            Backend::File { path, lock } => {
                let _guard = lock.lock().await;
                for_each_record(path, |record| {
                    if let Record::Message(m) = record {
                        if m.thread_id == thread_id {
                            push(m.message);
                        }
                    }
                })
                .await?;
            }
        }

        while window.front().is_some_and(|m| m.role == ChatRole::Tool) {
            window.pop_front();
        }
        Ok(window.into())
    }

    pub async fn save_score(&self, record: ScoreRecord) -> Result<(), StoreError> {
        match &self.backend {
            Backend::InMemory(state) => state.lock().await.scores.push(record),
            Backend::File { path, lock } => {
                let _guard = lock.lock().await;
                append_lines(path, std::iter::once(Record::Score(record))).await?;
            }
        }
        Ok(())
    }

    /// All score records, in insertion order
    pub async fn scores(&self) -> Result<Vec<ScoreRecord>, StoreError> {
        match &self.backend {
            Backend::InMemory(state) => Ok(state.lock().await.scores.clone()),
            Backend::File { path, lock } => {
                let _guard = lock.lock().await;
                Ok(read_records(path)
                    .await?
                    .into_iter()
                    .filter_map(|record| match record {
                        Record::Score(s) => Some(s),
                        Record::Message(_) => None,
                    })
                    .collect())
            }
        }
    }
}

async fn append_lines(path: &Path, records: impl Iterator<Item = Record>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut buf = String::new();
    for record in records {
        buf.push_str(&serde_json::to_string(&record)?);
        buf.push('\n');
    }

    let mut file = fs::OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(buf.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

async fn read_records(path: &Path) -> Result<Vec<Record>, StoreError> {
    let mut records = Vec::new();
    for_each_record(path, |record| records.push(record)).await?;
    Ok(records)
}

/// Decode `path` line by line; a missing file holds no records
async fn for_each_record(path: &Path, mut f: impl FnMut(Record)) -> Result<(), StoreError> {
    let file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut lines = BufReader::new(file).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        f(serde_json::from_str(&line)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolCall;

    fn score(run_id: &str) -> ScoreRecord {
        ScoreRecord {
            run_id: run_id.into(),
            agent_id: "mail-verifier-agent".into(),
            scorer: "Completeness".into(),
            score: 0.5,
            reason: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_storage_url() {
        assert_eq!(":memory:".parse::<StorageUrl>().unwrap(), StorageUrl::InMemory);
        assert_eq!(
            "file:../agents.db".parse::<StorageUrl>().unwrap(),
            StorageUrl::File(PathBuf::from("../agents.db"))
        );
        assert!("file:".parse::<StorageUrl>().is_err());
        assert!("postgres://db".parse::<StorageUrl>().is_err());
        assert_eq!(StorageUrl::File("a.db".into()).to_string(), "file:a.db");
    }

    #[tokio::test]
    async fn test_in_memory_recall_is_per_thread_and_bounded() {
        let store = MemoryStore::in_memory();
        store
            .append_messages("t1", &[ChatMessage::user("one"), ChatMessage::assistant("two")])
            .await
            .unwrap();
        store.append_messages("t2", &[ChatMessage::user("other")]).await.unwrap();
        store.append_messages("t1", &[ChatMessage::user("three")]).await.unwrap();

        let recent = store.recall("t1", 2).await.unwrap();
        assert_eq!(
            recent.iter().map(|m| m.content.as_str()).collect::<Vec<_>>(),
            ["two", "three"]
        );
        assert!(store.recall("missing", 10).await.unwrap().is_empty());
    }

    fn tool_turn(n: usize) -> Vec<ChatMessage> {
        let call_id = format!("c{n}");
        vec![
            ChatMessage::user(format!("question {n}")),
            ChatMessage::assistant("").with_tool_calls(vec![ToolCall {
                id: call_id.clone(),
                name: "mailboxlayerTool".into(),
                arguments: serde_json::json!({"email": "a@b.com"}),
            }]),
            ChatMessage::tool(call_id, "{}"),
            ChatMessage::assistant(format!("answer {n}")),
        ]
    }

    #[tokio::test]
    async fn test_recall_skips_orphaned_tool_replies() {
        let store = MemoryStore::in_memory();
        for n in 0..3 {
            store.append_messages("ctx", &tool_turn(n)).await.unwrap();
        }

        // A window of 10 over 12 messages opens on the reply to c0.
        let recalled = store.recall("ctx", 10).await.unwrap();
        assert_eq!(recalled.len(), 9);
        assert_eq!(recalled[0].role, ChatRole::Assistant);
        assert_eq!(recalled[0].content, "answer 0");

        let recalled = store.recall("ctx", 11).await.unwrap();
        assert_eq!(recalled.len(), 11);
        assert_eq!(recalled[0].tool_calls[0].id, "c0");
        assert!(store.recall("ctx", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_recall_skips_orphaned_tool_replies() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(StorageUrl::File(dir.path().join("memory.jsonl")));
        for n in 0..4 {
            store.append_messages("ctx", &tool_turn(n)).await.unwrap();
        }
        store.append_messages("other", &tool_turn(9)).await.unwrap();

        let recalled = store.recall("ctx", 10).await.unwrap();
        assert_ne!(recalled[0].role, ChatRole::Tool);
        assert_eq!(recalled.last().unwrap().content, "answer 3");
        assert!(recalled.iter().all(|m| m.content != "question 9"));
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let url = StorageUrl::File(dir.path().join("nested/memory.jsonl"));

        let store = MemoryStore::open(url.clone());
        assert!(store.recall("t", 5).await.unwrap().is_empty());
        store.append_messages("t", &[ChatMessage::user("hello")]).await.unwrap();
        store.save_score(score("r1")).await.unwrap();

        let reopened = MemoryStore::open(url);
        let recalled = reopened.recall("t", 5).await.unwrap();
        assert_eq!(recalled, vec![ChatMessage::user("hello")]);
        assert_eq!(reopened.scores().await.unwrap()[0].run_id, "r1");
    }
}
