use serde::{Serialize, Deserialize};
use crate::models::{Poll, Vote};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub label: String,
    pub votes: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub total_votes: usize,
    pub options: Vec<OptionTally>,
}

impl PollResults {
    /// Votes for other polls and votes whose index is outside the poll's
    /// options are not counted, in the totals or the percentages.
    pub fn tally(poll: &Poll, votes: &[Vote]) -> Self {
        let mut counts = vec![0usize; poll.options.len()];

        for vote in votes.iter().filter(|v| v.poll_uri == poll.uri) {
            if let Some(count) = usize::try_from(vote.option_index).ok().and_then(|i| counts.get_mut(i)) {
                *count += 1;
            }
        }

        let total_votes: usize = counts.iter().sum();
        let options = poll.options.iter()
            .zip(counts)
            .map(|(label, votes)| OptionTally {
                label: label.clone(),
                votes,
                percentage: if total_votes == 0 { 0.0 } else { 100.0 * votes as f64 / total_votes as f64 },
            })
            .collect();

        Self { total_votes, options }
    }
}
