//! Session middleware configuration.
//!
//! Visitor order state lives in tower-sessions backed by an in-process
//! store. Orders are short-lived and a restart losing them is acceptable.
//! The store holds at most `SESSION_MAX_ENTRIES` records: expired ones are
//! dropped on every new session, and when it is still full the record
//! closest to expiry goes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, cookie::SameSite, session_store};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gante_session";

/// Idle time before an unfinished order is dropped (one day).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// In-memory session store with a fixed capacity.
#[derive(Debug, Clone)]
pub struct BoundedMemoryStore {
    records: Arc<Mutex<HashMap<Id, Record>>>,
    capacity: usize,
}

impl BoundedMemoryStore {
    /// Create an empty store. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Number of records currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Insert `record`, making room first when it is a new id.
    fn insert(&self, records: &mut HashMap<Id, Record>, record: Record) {
        if !records.contains_key(&record.id) && records.len() >= self.capacity {
            let now = OffsetDateTime::now_utc();
            records.retain(|_, r| is_active(r.expiry_date, now));

            if records.len() >= self.capacity {
                let oldest = records
                    .values()
                    .min_by_key(|r| r.expiry_date)
                    .map(|r| r.id);
                if let Some(id) = oldest {
                    records.remove(&id);
                    tracing::debug!(capacity = self.capacity, "Session store full, evicted oldest");
                }
            }
        }
        records.insert(record.id, record);
    }
}

#[async_trait]
impl SessionStore for BoundedMemoryStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.insert(&mut records, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let mut records = self.records.lock().await;
        self.insert(&mut records, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let now = OffsetDateTime::now_utc();
        Ok(self
            .records
            .lock()
            .await
            .get(session_id)
            .filter(|r| is_active(r.expiry_date, now))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.lock().await.remove(session_id);
        Ok(())
    }
}

fn is_active(expiry_date: OffsetDateTime, now: OffsetDateTime) -> bool {
    expiry_date > now
}

/// Create the session layer over a fresh bounded store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<BoundedMemoryStore> {
    SessionManagerLayer::new(BoundedMemoryStore::new(config.session_max_entries))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(SESSION_EXPIRY_SECONDS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(expires_in: Duration) -> Record {
        Record {
            id: Id::default(),
            data: HashMap::default(),
            expiry_date: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = BoundedMemoryStore::new(4);
        let mut r = record(Duration::minutes(30));
        store.create(&mut r).await.unwrap();
        assert_eq!(store.load(&r.id).await.unwrap(), Some(r.clone()));

        store.delete(&r.id).await.unwrap();
        assert_eq!(store.load(&r.id).await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_never_grows_past_capacity() {
        let store = BoundedMemoryStore::new(3);
        let mut ids = Vec::new();
        for minutes in 1..=10 {
            let mut r = record(Duration::minutes(minutes));
            store.create(&mut r).await.unwrap();
            ids.push(r.id);
        }
        assert_eq!(store.len().await, 3);

        // The three latest to expire survive.
        for id in &ids[..7] {
            assert_eq!(store.load(id).await.unwrap(), None);
        }
        for id in &ids[7..] {
            assert!(store.load(id).await.unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_expired_records_go_first() {
        let store = BoundedMemoryStore::new(2);
        let mut stale = record(Duration::minutes(-5));
        let mut live = record(Duration::minutes(1));
        store.create(&mut stale).await.unwrap();
        store.create(&mut live).await.unwrap();
        assert_eq!(store.load(&stale.id).await.unwrap(), None);

        let mut fresh = record(Duration::minutes(60));
        store.create(&mut fresh).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.load(&live.id).await.unwrap().is_some());
        assert!(store.load(&fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_saving_existing_session_does_not_evict() {
        let store = BoundedMemoryStore::new(2);
        let mut a = record(Duration::minutes(1));
        let mut b = record(Duration::minutes(2));
        store.create(&mut a).await.unwrap();
        store.create(&mut b).await.unwrap();

        a.expiry_date = OffsetDateTime::now_utc() + Duration::minutes(90);
        store.save(&a).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.load(&b.id).await.unwrap().is_some());
    }
}
