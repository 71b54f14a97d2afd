use serde::{Serialize, Deserialize};
use serde_json::Value;
use crate::error::RepoError;

/// Identity of a record as assigned by the author's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub uri: String,
    pub cid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Create { collection: String, record: Value },
    Delete { collection: String, rkey: String },
}

/// Per-operation result of a batched repository write, in request order.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteResult {
    Created(CommitRef),
    Deleted,
    Unknown,
}

/// The repository write RPC, supplied by the host with the caller's
/// credentials already bound.
#[rocket::async_trait]
pub trait RepoWriter: Send + Sync {
    async fn create_record(&self, author: &str, collection: &str, record: Value) -> Result<CommitRef, RepoError>;

    async fn apply_writes(&self, author: &str, writes: Vec<WriteOp>) -> Result<Vec<WriteResult>, RepoError>;
}
