// crates/vigil-economics/src/memory.rs
//
// In-memory SnapshotStore for tests and embedding. Event sequence numbers
// start at 1.

use async_trait::async_trait;
use tokio::sync::RwLock;

use vigil_core::error::VigilError;
use vigil_core::traits::SnapshotStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<Vec<u8>>>,
    events: RwLock<Vec<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn save_snapshot(&self, bytes: &[u8]) -> Result<(), VigilError> {
        *self.snapshot.write().await = Some(bytes.to_vec());
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<Vec<u8>>, VigilError> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn append_events(&self, events: &[Vec<u8>]) -> Result<u64, VigilError> {
        let mut log = self.events.write().await;
        log.extend(events.iter().cloned());
        Ok(log.len() as u64)
    }

    async fn commit(&self, events: &[Vec<u8>], snapshot: &[u8]) -> Result<u64, VigilError> {
        let mut log = self.events.write().await;
        let mut stored = self.snapshot.write().await;
        log.extend(events.iter().cloned());
        *stored = Some(snapshot.to_vec());
        Ok(log.len() as u64)
    }

    async fn read_events(&self, from: u64, limit: usize) -> Result<Vec<(u64, Vec<u8>)>, VigilError> {
        let log = self.events.read().await;
        let start = from.max(1);
        Ok(log
            .iter()
            .enumerate()
            .map(|(i, bytes)| (i as u64 + 1, bytes))
            .skip_while(|(seq, _)| *seq < start)
            .take(limit)
            .map(|(seq, bytes)| (seq, bytes.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_sequence_numbers() {
        let store = MemoryStore::new();
        assert_eq!(store.append_events(&[]).await.unwrap(), 0);
        assert_eq!(store.append_events(&[b"a".to_vec(), b"b".to_vec()]).await.unwrap(), 2);
        assert_eq!(store.append_events(&[b"c".to_vec()]).await.unwrap(), 3);

        let tail = store.read_events(2, 10).await.unwrap();
        assert_eq!(tail, vec![(2, b"b".to_vec()), (3, b"c".to_vec())]);
        assert_eq!(store.read_events(0, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_writes_events_and_snapshot() {
        let store = MemoryStore::new();
        store.append_events(&[b"a".to_vec()]).await.unwrap();
        assert_eq!(store.commit(&[b"b".to_vec(), b"c".to_vec()], b"snap").await.unwrap(), 3);
        assert_eq!(store.load_snapshot().await.unwrap(), Some(b"snap".to_vec()));
        assert_eq!(store.read_events(3, 1).await.unwrap(), vec![(3, b"c".to_vec())]);
    }

    #[tokio::test]
    async fn test_snapshot_overwrite() {
        let store = MemoryStore::new();
        assert!(store.load_snapshot().await.unwrap().is_none());
        store.save_snapshot(b"one").await.unwrap();
        store.save_snapshot(b"two").await.unwrap();
        assert_eq!(store.load_snapshot().await.unwrap(), Some(b"two".to_vec()));
    }
}
