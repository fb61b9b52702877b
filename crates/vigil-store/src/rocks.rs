// crates/vigil-store/src/rocks.rs
//
// RocksDB-backed persistent storage for engine snapshots and the event journal.
//
// Key format:
//   - Snapshot: `snapshot:engine`        -> encoded EngineSnapshot bytes
//   - Journal:  `event:{seq:020}`        -> encoded EngineEvent bytes
//   - Counter:  `meta:event_seq`         -> last assigned sequence (u64, big-endian)
//
// Sequence numbers are zero-padded so lexicographic key order matches numeric
// order and a forward iterator from `event:{from}` yields the journal in order.

use async_trait::async_trait;
use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteBatch};
use tokio::sync::Mutex;

use vigil_core::error::VigilError;
use vigil_core::traits::SnapshotStore;

const SNAPSHOT_KEY: &[u8] = b"snapshot:engine";
const EVENT_SEQ_KEY: &[u8] = b"meta:event_seq";
const EVENT_PREFIX: &str = "event:";

/// RocksDB wrapper implementing the `SnapshotStore` trait.
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    path: String,
    /// Last assigned journal sequence. Held across the batch write so
    /// concurrent appends never reuse a number.
    last_seq: Mutex<u64>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore").field("path", &self.path).finish()
    }
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist.
    pub fn open(path: &str) -> Result<Self, VigilError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path)
            .map_err(|e| VigilError::Storage(format!("Failed to open RocksDB at {}: {}", path, e)))?;

        let last_seq = match db
            .get(EVENT_SEQ_KEY)
            .map_err(|e| VigilError::Storage(format!("RocksDB get failed: {}", e)))?
        {
            Some(bytes) => decode_seq(&bytes)?,
            None => 0,
        };
        tracing::info!("Opened RocksDB store at {} (journal at seq {})", path, last_seq);

        Ok(Self {
            db,
            path: path.to_string(),
            last_seq: Mutex::new(last_seq),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Sequence number of the newest journal entry, 0 if the journal is empty.
    pub async fn last_sequence(&self) -> u64 {
        *self.last_seq.lock().await
    }

    /// Build the journal key for a sequence number: `event:{seq:020}`.
    fn event_key(seq: u64) -> Vec<u8> {
        format!("{}{:020}", EVENT_PREFIX, seq).into_bytes()
    }

    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), VigilError> {
        self.db
            .put(key, value)
            .map_err(|e| VigilError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, VigilError> {
        self.db
            .get(key)
            .map_err(|e| VigilError::Storage(format!("RocksDB get failed: {}", e)))
    }

    /// Write journal entries, the sequence counter and optionally the snapshot
    /// in one batch. The counter lock is held across the write so concurrent
    /// writers never reuse a sequence number.
    async fn write_journal(&self, events: &[Vec<u8>], snapshot: Option<&[u8]>) -> Result<u64, VigilError> {
        let mut last_seq = self.last_seq.lock().await;
        if events.is_empty() && snapshot.is_none() {
            return Ok(*last_seq);
        }

        let mut seq = *last_seq;
        let mut batch = WriteBatch::default();
        for event in events {
            seq += 1;
            batch.put(Self::event_key(seq), event);
        }
        if seq != *last_seq {
            batch.put(EVENT_SEQ_KEY, seq.to_be_bytes());
        }
        if let Some(bytes) = snapshot {
            batch.put(SNAPSHOT_KEY, bytes);
        }
        self.db
            .write(batch)
            .map_err(|e| VigilError::Storage(format!("RocksDB batch write failed: {}", e)))?;

        if !events.is_empty() {
            tracing::debug!("Appended {} events (seq {}..={})", events.len(), *last_seq + 1, seq);
        }
        *last_seq = seq;
        Ok(seq)
    }

    /// Synchronous snapshot read for callers outside an async context.
    pub fn load_snapshot_sync(&self) -> Result<Option<Vec<u8>>, VigilError> {
        self.get_raw(SNAPSHOT_KEY)
    }
}

#[async_trait]
impl SnapshotStore for RocksStore {
    async fn save_snapshot(&self, bytes: &[u8]) -> Result<(), VigilError> {
        self.put_raw(SNAPSHOT_KEY, bytes)
    }

    async fn load_snapshot(&self) -> Result<Option<Vec<u8>>, VigilError> {
        self.load_snapshot_sync()
    }

    async fn append_events(&self, events: &[Vec<u8>]) -> Result<u64, VigilError> {
        self.write_journal(events, None).await
    }

    async fn commit(&self, events: &[Vec<u8>], snapshot: &[u8]) -> Result<u64, VigilError> {
        self.write_journal(events, Some(snapshot)).await
    }

    async fn read_events(&self, from: u64, limit: usize) -> Result<Vec<(u64, Vec<u8>)>, VigilError> {
        let start = Self::event_key(from.max(1));
        let prefix = EVENT_PREFIX.as_bytes();
        let mut out = Vec::new();

        let iter = self.db.iterator(IteratorMode::From(start.as_slice(), Direction::Forward));
        for item in iter {
            if out.len() >= limit {
                break;
            }
            let (key, value) = item
                .map_err(|e| VigilError::Storage(format!("RocksDB iteration error: {}", e)))?;

            // Stop once we leave the journal keyspace.
            if !key.starts_with(prefix) {
                break;
            }

            let seq = std::str::from_utf8(&key[prefix.len()..])
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| VigilError::Storage(format!("Malformed journal key: {:?}", key)))?;
            out.push((seq, value.to_vec()));
        }

        Ok(out)
    }
}

fn decode_seq(bytes: &[u8]) -> Result<u64, VigilError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| VigilError::Storage(format!("Corrupt journal counter ({} bytes)", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_keys_sort_numerically() {
        let k9 = RocksStore::event_key(9);
        let k10 = RocksStore::event_key(10);
        assert_eq!(k9, b"event:00000000000000000009".to_vec());
        assert!(k9 < k10);
        assert!(RocksStore::event_key(u64::MAX).len() == k9.len());
    }

    #[test]
    fn test_decode_seq() {
        assert_eq!(decode_seq(&42u64.to_be_bytes()).unwrap(), 42);
        assert!(matches!(decode_seq(&[1, 2, 3]), Err(VigilError::Storage(_))));
    }

    #[test]
    fn test_snapshot_key_outside_journal() {
        assert!(!SNAPSHOT_KEY.starts_with(EVENT_PREFIX.as_bytes()));
        assert!(!EVENT_SEQ_KEY.starts_with(EVENT_PREFIX.as_bytes()));
    }
}
