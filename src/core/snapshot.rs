use crate::domain::model::{OutageRecord, Snapshot};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    outages: &'a [OutageRecord],
}

/// Writes the `{"outages": [...]}` artifact, replacing the previous one.
pub struct SnapshotWriter<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> SnapshotWriter<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub async fn write(&self, outages: &[OutageRecord]) -> Result<()> {
        // serde_json leaves non-ASCII characters unescaped.
        let json = serde_json::to_vec(&SnapshotRef { outages })?;

        tracing::info!(
            file = %self.file_name,
            records = outages.len(),
            "Writing outage snapshot"
        );
        self.storage.write_file(&self.file_name, &json).await
    }

    pub async fn read(&self) -> Result<Snapshot> {
        let data = self.storage.read_file(&self.file_name).await?;
        Ok(serde_json::from_slice(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ScrapeError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ScrapeError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn record(sub_region: &str, info_text: &str) -> OutageRecord {
        OutageRecord {
            sub_region: sub_region.to_string(),
            start_time: "2024-01-05 10:00".to_string(),
            end_time: "2024-01-05 14:00".to_string(),
            info_text: info_text.to_string(),
            last_update: "Uppdaterad 10:05".to_string(),
            affected_customers: 12,
        }
    }

    #[tokio::test]
    async fn test_non_ascii_is_written_verbatim() {
        let storage = MockStorage::new();
        let writer = SnapshotWriter::new(storage.clone(), "outdata.json");

        writer
            .write(&[record("åre", "Störning i området Åre")])
            .await
            .unwrap();

        let raw = String::from_utf8(storage.get_file("outdata.json").await.unwrap()).unwrap();
        assert!(raw.contains("Störning i området Åre"));
        assert!(!raw.contains("\\u"));

        let snapshot = writer.read().await.unwrap();
        assert_eq!(snapshot.outages[0].info_text, "Störning i området Åre");
    }

    #[tokio::test]
    async fn test_field_layout() {
        let storage = MockStorage::new();
        let writer = SnapshotWriter::new(storage.clone(), "outdata.json");
        writer.write(&[record("solna", "Planerat arbete")]).await.unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&storage.get_file("outdata.json").await.unwrap()).unwrap();
        let outage = &value["outages"][0];
        assert_eq!(outage["municipality"], "solna");
        assert_eq!(outage["start_time"], "2024-01-05 10:00");
        assert_eq!(outage["end_time"], "2024-01-05 14:00");
        assert_eq!(outage["info_text"], "Planerat arbete");
        assert_eq!(outage["last_update"], "Uppdaterad 10:05");
        assert_eq!(outage["affected_customers"], 12);
    }

    #[tokio::test]
    async fn test_second_write_replaces_first() {
        let storage = MockStorage::new();
        let writer = SnapshotWriter::new(storage.clone(), "outdata.json");

        writer.write(&[record("solna", "a")]).await.unwrap();
        writer.write(&[]).await.unwrap();

        let raw = String::from_utf8(storage.get_file("outdata.json").await.unwrap()).unwrap();
        assert_eq!(raw, r#"{"outages":[]}"#);
    }
}
