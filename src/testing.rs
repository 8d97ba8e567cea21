//! In-memory stand-ins for the external collaborators, used by unit tests.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    calories::{food::FoodCandidate, usda::FoodSource},
    error::AppError,
    store::KvStore,
};

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryStore {
    fn live(
        entries: &mut HashMap<String, (String, Option<Instant>)>,
        key: &str,
        now: Instant,
    ) -> bool {
        match entries.get(key) {
            Some((_, Some(deadline))) if *deadline <= now => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        if !Self::live(&mut entries, key, Instant::now()) {
            return Ok(None);
        }
        Ok(entries.get(key).map(|(v, _)| v.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), (value.to_owned(), deadline));
        Ok(())
    }

    async fn incr_window(&self, key: &str, window: Duration) -> anyhow::Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if !Self::live(&mut entries, key, now) {
            entries.insert(key.to_owned(), ("1".into(), Some(now + window)));
            return Ok(1);
        }
        let (value, _) = entries.get_mut(key).expect("live entry");
        let count: u64 = value.parse::<u64>()? + 1;
        *value = count.to_string();
        Ok(count)
    }

    async fn ttl(&self, key: &str) -> anyhow::Result<Option<u64>> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if !Self::live(&mut entries, key, now) {
            return Ok(None);
        }
        Ok(entries
            .get(key)
            .and_then(|(_, deadline)| *deadline)
            .map(|deadline| deadline.saturating_duration_since(now).as_secs()))
    }
}

/// A store whose backend is always down.
pub struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("store offline")
    }
    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> anyhow::Result<()> {
        anyhow::bail!("store offline")
    }
    async fn incr_window(&self, _key: &str, _window: Duration) -> anyhow::Result<u64> {
        anyhow::bail!("store offline")
    }
    async fn ttl(&self, _key: &str) -> anyhow::Result<Option<u64>> {
        anyhow::bail!("store offline")
    }
}

/// Memory store whose `set` parks until released, for observing writes in flight.
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryStore,
    write_started: Notify,
    release: Notify,
}

impl GatedStore {
    pub async fn write_started(&self) {
        self.write_started.notified().await;
    }

    pub fn release_writes(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl KvStore for GatedStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
        self.write_started.notify_one();
        self.release.notified().await;
        self.inner.set(key, value, ttl).await
    }

    async fn incr_window(&self, key: &str, window: Duration) -> anyhow::Result<u64> {
        self.inner.incr_window(key, window).await
    }

    async fn ttl(&self, key: &str) -> anyhow::Result<Option<u64>> {
        self.inner.ttl(key).await
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl UserRepo for MemoryUsers {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().await.get(email).cloned())
    }

    async fn create(&self, new_user: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().await;
        if users.contains_key(new_user.email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.to_owned(),
            password_hash: new_user.password_hash.to_owned(),
            first_name: new_user.first_name.to_owned(),
            last_name: new_user.last_name.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.email.clone(), user.clone());
        Ok(Some(user))
    }
}

#[derive(Debug, Clone)]
pub enum StubReply {
    Foods(Vec<FoodCandidate>),
    RateLimited,
    Unavailable,
}

/// Food source with a canned reply that counts how often it was asked.
pub struct StubFoods {
    reply: StubReply,
    calls: AtomicUsize,
}

impl StubFoods {
    pub fn new(reply: StubReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FoodSource for StubFoods {
    async fn search(&self, _dish_name: &str) -> Result<Vec<FoodCandidate>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            StubReply::Foods(foods) => Ok(foods.clone()),
            StubReply::RateLimited => Err(AppError::RateLimited {
                message: "Rate Limit Exceeded".into(),
                retry_after: None,
            }),
            StubReply::Unavailable => Err(AppError::UpstreamUnavailable),
        }
    }
}
