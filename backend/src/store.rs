use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use shared::models::*;
use crate::error::StoreError;

/// The local projection of poll and vote records.
///
/// Every mutation is keyed: upserts overwrite by key and deletes are no-ops
/// when the key is absent. Writers never read before they write, so the
/// ingester and request handlers can share one store without coordination.
#[rocket::async_trait]
pub trait ProjectionStore: Send + Sync {
    async fn upsert_poll(&self, poll: &Poll) -> Result<(), StoreError>;

    /// Returns whether a row was removed.
    async fn delete_poll(&self, uri: &str) -> Result<bool, StoreError>;

    /// Upserts on `(author_did, poll_uri)`, replacing the previous vote of the
    /// pair (including its URI). A row that already holds `vote.uri` for a
    /// different pair is displaced.
    async fn upsert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// Returns whether a row was removed.
    async fn delete_vote(&self, uri: &str) -> Result<bool, StoreError>;

    async fn get_poll(&self, uri: &str) -> Result<Option<Poll>, StoreError>;

    async fn votes_for_poll(&self, poll_uri: &str) -> Result<Vec<Vote>, StoreError>;

    async fn vote_by_author(&self, author_did: &str, poll_uri: &str) -> Result<Option<Vote>, StoreError>;

    async fn load_cursor(&self, service: &str) -> Result<Option<i64>, StoreError>;

    async fn save_cursor(&self, service: &str, cursor: i64) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
struct Tables {
    polls: HashMap<String, Poll>,
    votes: HashMap<String, Vote>,
    cursors: HashMap<String, i64>,
}

/// In-process projection with the same key semantics as the Postgres store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Polls and votes sorted by URI.
    pub fn snapshot(&self) -> Result<(Vec<Poll>, Vec<Vote>), StoreError> {
        let tables = self.lock()?;
        let mut polls: Vec<_> = tables.polls.values().cloned().collect();
        let mut votes: Vec<_> = tables.votes.values().cloned().collect();
        polls.sort_by(|a, b| a.uri.cmp(&b.uri));
        votes.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok((polls, votes))
    }
}

#[rocket::async_trait]
impl ProjectionStore for MemoryStore {
    async fn upsert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        self.lock()?.polls.insert(poll.uri.clone(), poll.clone());
        Ok(())
    }

    async fn delete_poll(&self, uri: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.polls.remove(uri).is_some())
    }

    async fn upsert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.votes.retain(|uri, v| uri != &vote.uri && !v.is_for(&vote.author_did, &vote.poll_uri));
        tables.votes.insert(vote.uri.clone(), vote.clone());
        Ok(())
    }

    async fn delete_vote(&self, uri: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.votes.remove(uri).is_some())
    }

    async fn get_poll(&self, uri: &str) -> Result<Option<Poll>, StoreError> {
        Ok(self.lock()?.polls.get(uri).cloned())
    }

    async fn votes_for_poll(&self, poll_uri: &str) -> Result<Vec<Vote>, StoreError> {
        let mut votes: Vec<_> = self.lock()?
            .votes
            .values()
            .filter(|v| v.poll_uri == poll_uri)
            .cloned()
            .collect();
        votes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.uri.cmp(&b.uri)));
        Ok(votes)
    }

    async fn vote_by_author(&self, author_did: &str, poll_uri: &str) -> Result<Option<Vote>, StoreError> {
        Ok(self.lock()?
            .votes
            .values()
            .find(|v| v.is_for(author_did, poll_uri))
            .cloned())
    }

    async fn load_cursor(&self, service: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.lock()?.cursors.get(service).copied())
    }

    async fn save_cursor(&self, service: &str, cursor: i64) -> Result<(), StoreError> {
        self.lock()?.cursors.insert(service.to_string(), cursor);
        Ok(())
    }
}
