use shared::filter::Mutation;
use tracing::debug;
use crate::error::StoreError;
use crate::store::ProjectionStore;

pub struct Reconciler;

impl Reconciler {
    /// Applies one accepted mutation. Creates and updates are both
    /// "set current state for this key", and deletes of absent rows succeed,
    /// so redelivered events leave the projection unchanged.
    pub async fn apply(store: &dyn ProjectionStore, mutation: &Mutation) -> Result<(), StoreError> {
        match mutation {
            Mutation::UpsertPoll(poll) => {
                debug!(uri = %poll.uri, question = %poll.question, "ingesting poll");
                store.upsert_poll(poll).await
            }
            Mutation::DeletePoll { uri } => {
                let removed = store.delete_poll(uri).await?;
                debug!(uri = %uri, removed, "deleting poll");
                Ok(())
            }
            Mutation::UpsertVote(vote) => {
                debug!(uri = %vote.uri, poll = %vote.poll_uri, option = vote.option_index, "ingesting vote");
                store.upsert_vote(vote).await
            }
            Mutation::DeleteVote { uri } => {
                let removed = store.delete_vote(uri).await?;
                debug!(uri = %uri, removed, "deleting vote");
                Ok(())
            }
        }
    }
}
