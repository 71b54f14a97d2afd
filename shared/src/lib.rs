pub mod event;
pub mod filter;
pub mod models;
pub mod tally;
pub mod uri;
pub mod validation;

pub use event::{EventKind, RepoEvent};
pub use filter::{classify, Classified, Mutation, Rejection};
pub use models::*;
pub use tally::{OptionTally, PollResults};
pub use uri::{AtUri, UriError};
pub use validation::*;

#[cfg(test)]
mod tests;
