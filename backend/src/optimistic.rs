//! Projection writes made right after a confirmed repository write, so the
//! acting user reads their own change before the relay delivers it.
//!
//! Nothing here fails the caller. The relay event for the same record is
//! applied later through the ingester and repairs anything missed.

use shared::models::{Poll, Vote};
use tracing::warn;
use crate::repo::{CommitRef, WriteResult};
use crate::store::ProjectionStore;

/// Position of the create in a `[delete previous, create replacement]` batch.
const REPLACE_CREATE_INDEX: usize = 1;

pub struct OptimisticWriter;

impl OptimisticWriter {
    pub async fn record_poll(store: &dyn ProjectionStore, poll: &Poll) -> bool {
        match store.upsert_poll(poll).await {
            Ok(()) => true,
            Err(e) => {
                warn!(uri = %poll.uri, "projection write failed, leaving it to relay delivery: {}", e);
                false
            }
        }
    }

    pub async fn record_vote(store: &dyn ProjectionStore, vote: &Vote) -> bool {
        match store.upsert_vote(vote).await {
            Ok(()) => true,
            Err(e) => {
                warn!(uri = %vote.uri, "projection write failed, leaving it to relay delivery: {}", e);
                false
            }
        }
    }

    /// The new row goes in first: its `(author, poll)` key displaces the
    /// previous vote in the same write, so readers never see the author
    /// without a vote. The delete afterwards only matters when the previous
    /// row was stored under a different key.
    pub async fn record_vote_replace(store: &dyn ProjectionStore, previous_uri: &str, replacement: &Vote) -> bool {
        if !Self::record_vote(store, replacement).await {
            return false;
        }

        if previous_uri == replacement.uri {
            return true;
        }

        match store.delete_vote(previous_uri).await {
            Ok(_) => true,
            Err(e) => {
                warn!(uri = %previous_uri, "failed to remove replaced vote from projection: {}", e);
                false
            }
        }
    }

    /// The create result of a replace batch, if the repository confirmed it.
    /// Anything else means the replacement may not exist remotely and the
    /// previous vote must stay visible.
    pub fn confirmed_create(results: &[WriteResult]) -> Option<&CommitRef> {
        match results.get(REPLACE_CREATE_INDEX) {
            Some(WriteResult::Created(commit)) => Some(commit),
            _ => None,
        }
    }
}
