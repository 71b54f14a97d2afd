use serde::{Serialize, Deserialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Create,
    Update,
    Delete,
}

/// One repository change as delivered by the relay, independent of transport.
///
/// `record` is present for creates and updates and absent for deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoEvent {
    pub kind: EventKind,
    pub collection: String,
    pub uri: String,
    pub cid: Option<String>,
    pub author: String,
    pub record: Option<Value>,
}
