use serde_json::Value;
use shared::models::*;
use shared::uri::AtUri;
use shared::validation::{validate_poll_record, validate_vote_record, ValidationError};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use crate::error::ActionError;
use crate::optimistic::OptimisticWriter;
use crate::repo::{CommitRef, RepoWriter, WriteOp};
use crate::store::ProjectionStore;

#[derive(Debug, Clone, PartialEq)]
pub enum VoteOutcome {
    Created(CommitRef),
    Replaced(CommitRef),
    /// The repository did not confirm the replacement record; the previous
    /// vote is left in place locally.
    Unconfirmed,
}

fn to_value<T: serde::Serialize>(record: &T) -> Result<Value, ValidationError> {
    serde_json::to_value(record).map_err(|e| ValidationError::Malformed(e.to_string()))
}

#[instrument(skip(store, repo, options))]
pub async fn publish_poll(
    store: &dyn ProjectionStore,
    repo: &dyn RepoWriter,
    author: &str,
    question: &str,
    options: Vec<String>,
    now: OffsetDateTime,
) -> Result<CommitRef, ActionError> {
    let record = PollRecord::new(question, options, now)?;
    let created_at = validate_poll_record(&record)?;

    let commit = repo
        .create_record(author, POLL_COLLECTION, to_value(&record)?)
        .await
        .map_err(|e| {
            warn!("failed to write record: {}", e);
            e
        })?;

    OptimisticWriter::record_poll(store, &Poll {
        uri: commit.uri.clone(),
        author_did: author.to_string(),
        cid: commit.cid.clone(),
        question: record.question,
        options: record.options,
        created_at,
        indexed_at: now,
    })
    .await;

    Ok(commit)
}

#[instrument(skip(store, repo))]
pub async fn cast_vote(
    store: &dyn ProjectionStore,
    repo: &dyn RepoWriter,
    author: &str,
    poll_uri: &str,
    option_index: i32,
    now: OffsetDateTime,
) -> Result<VoteOutcome, ActionError> {
    let poll = store.get_poll(poll_uri).await?.ok_or(ActionError::PollNotFound)?;

    if usize::try_from(option_index).map_or(true, |i| i >= poll.options.len()) {
        return Err(ValidationError::InvalidOptionIndex(i64::from(option_index)).into());
    }

    let existing = store.vote_by_author(author, poll_uri).await?;
    let record = VoteRecord::new(&poll, option_index, now)?;
    let created_at = validate_vote_record(&record)?;
    let value = to_value(&record)?;

    let draft = |commit: &CommitRef| Vote {
        uri: commit.uri.clone(),
        author_did: author.to_string(),
        poll_uri: poll.uri.clone(),
        option_index,
        created_at,
        indexed_at: now,
    };

    let Some(previous) = existing else {
        let commit = repo
            .create_record(author, VOTE_COLLECTION, value)
            .await
            .map_err(|e| {
                warn!("failed to write record: {}", e);
                e
            })?;
        OptimisticWriter::record_vote(store, &draft(&commit)).await;
        return Ok(VoteOutcome::Created(commit));
    };

    let previous_rkey = AtUri::parse(&previous.uri)?.rkey;
    let results = repo
        .apply_writes(author, vec![
            WriteOp::Delete { collection: VOTE_COLLECTION.into(), rkey: previous_rkey },
            WriteOp::Create { collection: VOTE_COLLECTION.into(), record: value },
        ])
        .await
        .map_err(|e| {
            warn!("failed to replace record: {}", e);
            e
        })?;

    match OptimisticWriter::confirmed_create(&results) {
        Some(commit) => {
            OptimisticWriter::record_vote_replace(store, &previous.uri, &draft(commit)).await;
            Ok(VoteOutcome::Replaced(commit.clone()))
        }
        None => {
            info!(previous = %previous.uri, "vote replacement not confirmed; keeping previous vote");
            Ok(VoteOutcome::Unconfirmed)
        }
    }
}
