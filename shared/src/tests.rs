#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use time::macros::datetime;
    use time::OffsetDateTime;
    use crate::{
        classify, AtUri, Classified, EventKind, Mutation, Poll, PollRecord, PollResults, Rejection,
        RepoEvent, ValidationError, Vote, POLL_COLLECTION, VOTE_COLLECTION,
    };

    const NOW: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);
    const P1: &str = "at://did:plc:alice/pt.anto.polls.poll/p1";

    fn event(kind: EventKind, collection: &str, uri: &str, record: Option<Value>) -> RepoEvent {
        RepoEvent {
            kind,
            collection: collection.into(),
            uri: uri.into(),
            cid: Some("bafyreicid".into()),
            author: "did:plc:alice".into(),
            record,
        }
    }

    fn poll_record() -> Value {
        json!({
            "$type": "pt.anto.polls.poll",
            "question": "Best cuisine?",
            "options": ["Italian", "Thai"],
            "createdAt": "2025-03-01T11:59:00.000Z"
        })
    }

    fn vote_record(option_index: i64) -> Value {
        json!({
            "$type": "pt.anto.polls.vote",
            "poll": { "uri": P1, "cid": "bafyreipoll" },
            "optionIndex": option_index,
            "createdAt": "2025-03-01T12:00:00Z"
        })
    }

    fn rejected(classified: Classified) -> Rejection {
        match classified {
            Classified::Rejected(r) => r,
            Classified::Accepted(m) => panic!("expected rejection, got {:?}", m),
        }
    }

    fn poll(options: &[&str]) -> Poll {
        Poll {
            uri: P1.into(),
            author_did: "did:plc:alice".into(),
            cid: "bafyreipoll".into(),
            question: "Best cuisine?".into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            created_at: NOW,
            indexed_at: NOW,
        }
    }

    fn vote(uri: &str, author: &str, option_index: i32) -> Vote {
        Vote {
            uri: uri.into(),
            author_did: author.into(),
            poll_uri: P1.into(),
            option_index,
            created_at: NOW,
            indexed_at: NOW,
        }
    }

    #[test]
    fn test_poll_create_is_accepted() {
        let classified = classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(poll_record())), NOW);

        let Classified::Accepted(Mutation::UpsertPoll(poll)) = classified else {
            panic!("expected poll upsert, got {:?}", classified);
        };
        assert_eq!(poll.uri, P1);
        assert_eq!(poll.question, "Best cuisine?");
        assert_eq!(poll.options, vec!["Italian", "Thai"]);
        assert_eq!(poll.cid, "bafyreicid");
        assert_eq!(poll.created_at, datetime!(2025-03-01 11:59 UTC));
        assert_eq!(poll.indexed_at, NOW);
    }

    #[test]
    fn test_update_classifies_like_create() {
        let create = classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(poll_record())), NOW);
        let update = classify(&event(EventKind::Update, POLL_COLLECTION, P1, Some(poll_record())), NOW);
        assert_eq!(create, update);
    }

    #[test]
    fn test_vote_create_is_accepted() {
        let uri = "at://did:plc:alice/pt.anto.polls.vote/v1";
        let classified = classify(&event(EventKind::Create, VOTE_COLLECTION, uri, Some(vote_record(1))), NOW);

        assert_eq!(classified, Classified::Accepted(Mutation::UpsertVote(Vote {
            uri: uri.into(),
            author_did: "did:plc:alice".into(),
            poll_uri: P1.into(),
            option_index: 1,
            created_at: NOW,
            indexed_at: NOW,
        })));
    }

    #[test]
    fn test_main_type_suffix_is_accepted() {
        let mut record = vote_record(0);
        record["$type"] = json!("pt.anto.polls.vote#main");
        let classified = classify(&event(EventKind::Create, VOTE_COLLECTION, "at://a/pt.anto.polls.vote/v", Some(record)), NOW);
        assert!(matches!(classified, Classified::Accepted(Mutation::UpsertVote(_))));
    }

    #[test]
    fn test_deletes_need_no_payload() {
        let poll = classify(&event(EventKind::Delete, POLL_COLLECTION, P1, None), NOW);
        assert_eq!(poll, Classified::Accepted(Mutation::DeletePoll { uri: P1.into() }));

        let vote = classify(&event(EventKind::Delete, VOTE_COLLECTION, "at://a/pt.anto.polls.vote/v", None), NOW);
        assert_eq!(vote, Classified::Accepted(Mutation::DeleteVote { uri: "at://a/pt.anto.polls.vote/v".into() }));
    }

    #[test]
    fn test_foreign_and_malformed_records_are_rejected() {
        let foreign = classify(&event(EventKind::Create, "app.bsky.feed.post", "at://a/app.bsky.feed.post/x", Some(json!({}))), NOW);
        assert!(matches!(rejected(foreign), Rejection::ForeignCollection(_)));

        let mut wrong_type = poll_record();
        wrong_type["$type"] = json!("pt.anto.polls.vote");
        let r = rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(wrong_type)), NOW));
        assert_eq!(r, Rejection::Invalid(ValidationError::WrongType("pt.anto.polls.vote".into())));

        let mut no_type = poll_record();
        no_type.as_object_mut().unwrap().remove("$type");
        let r = rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(no_type)), NOW));
        assert!(matches!(r, Rejection::Invalid(ValidationError::WrongType(_))));

        let mut no_question = poll_record();
        no_question.as_object_mut().unwrap().remove("question");
        let r = rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(no_question)), NOW));
        assert!(matches!(r, Rejection::Invalid(ValidationError::Malformed(_))));

        let r = rejected(classify(&event(EventKind::Update, POLL_COLLECTION, P1, None), NOW));
        assert_eq!(r, Rejection::MissingRecord);

        let mut no_cid = event(EventKind::Create, POLL_COLLECTION, P1, Some(poll_record()));
        no_cid.cid = None;
        assert_eq!(rejected(classify(&no_cid, NOW)), Rejection::MissingCid);
    }

    #[test]
    fn test_poll_field_constraints() {
        let mut one_option = poll_record();
        one_option["options"] = json!(["Only"]);
        let r = rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(one_option)), NOW));
        assert_eq!(r, Rejection::Invalid(ValidationError::TooFewOptions));

        let mut blank_option = poll_record();
        blank_option["options"] = json!(["Italian", "  "]);
        let r = rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(blank_option)), NOW));
        assert_eq!(r, Rejection::Invalid(ValidationError::EmptyOption));

        let mut bad_date = poll_record();
        bad_date["createdAt"] = json!("yesterday");
        let r = rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(bad_date)), NOW));
        assert_eq!(r, Rejection::Invalid(ValidationError::InvalidDatetime("yesterday".into())));
    }

    #[test]
    fn test_vote_field_constraints() {
        let uri = "at://did:plc:alice/pt.anto.polls.vote/v1";

        let r = rejected(classify(&event(EventKind::Create, VOTE_COLLECTION, uri, Some(vote_record(-1))), NOW));
        assert_eq!(r, Rejection::Invalid(ValidationError::InvalidOptionIndex(-1)));

        let r = rejected(classify(&event(EventKind::Create, VOTE_COLLECTION, uri, Some(vote_record(i64::from(i32::MAX) + 1))), NOW));
        assert!(matches!(r, Rejection::Invalid(ValidationError::InvalidOptionIndex(_))));

        let mut not_a_poll = vote_record(0);
        not_a_poll["poll"]["uri"] = json!("at://did:plc:alice/app.bsky.feed.post/p1");
        let r = rejected(classify(&event(EventKind::Create, VOTE_COLLECTION, uri, Some(not_a_poll)), NOW));
        assert!(matches!(r, Rejection::Invalid(ValidationError::InvalidPollRef(_))));

        let mut index_as_string = vote_record(0);
        index_as_string["optionIndex"] = json!("0");
        let r = rejected(classify(&event(EventKind::Create, VOTE_COLLECTION, uri, Some(index_as_string)), NOW));
        assert!(matches!(r, Rejection::Invalid(ValidationError::Malformed(_))));
    }

    #[test]
    fn test_nul_characters_are_rejected() {
        let nul = Rejection::Invalid(ValidationError::NulCharacter);
        let vote_uri = "at://did:plc:alice/pt.anto.polls.vote/v1";

        let mut question = poll_record();
        question["question"] = json!("x\u{0}y");
        assert_eq!(rejected(classify(&event(EventKind::Create, POLL_COLLECTION, P1, Some(question)), NOW)), nul);

        let mut option = poll_record();
        option["options"] = json!(["Italian", "Th\u{0}ai"]);
        assert_eq!(rejected(classify(&event(EventKind::Update, POLL_COLLECTION, P1, Some(option)), NOW)), nul);

        let mut poll_ref = vote_record(0);
        poll_ref["poll"]["uri"] = json!("at://did:plc:alice/pt.anto.polls.poll/p\u{0}1");
        assert_eq!(rejected(classify(&event(EventKind::Create, VOTE_COLLECTION, vote_uri, Some(poll_ref)), NOW)), nul);

        let rkey = "at://did:plc:alice/pt.anto.polls.vote/v\u{0}";
        assert_eq!(rejected(classify(&event(EventKind::Delete, VOTE_COLLECTION, rkey, None), NOW)), nul);

        let mut author = event(EventKind::Create, POLL_COLLECTION, P1, Some(poll_record()));
        author.author = "did:plc:al\u{0}ice".into();
        assert_eq!(rejected(classify(&author, NOW)), nul);
    }

    #[test]
    fn test_tally() {
        let poll = poll(&["Italian", "Thai"]);
        let mut other_poll_vote = vote("at://c/pt.anto.polls.vote/v3", "did:plc:carol", 0);
        other_poll_vote.poll_uri = "at://x/pt.anto.polls.poll/other".into();

        let votes = [
            vote("at://a/pt.anto.polls.vote/v1", "did:plc:alice", 1),
            vote("at://b/pt.anto.polls.vote/v2", "did:plc:bob", 1),
            vote("at://d/pt.anto.polls.vote/v4", "did:plc:dave", 0),
            vote("at://e/pt.anto.polls.vote/v5", "did:plc:erin", 7),
            other_poll_vote,
        ];

        let results = PollResults::tally(&poll, &votes);
        assert_eq!(results.total_votes, 3);
        assert_eq!(results.options[0].label, "Italian");
        assert_eq!(results.options[0].votes, 1);
        assert_eq!(results.options[1].votes, 2);
        assert!((results.options[1].percentage - 200.0 / 3.0).abs() < 1e-9);

        let empty = PollResults::tally(&poll, &[]);
        assert_eq!(empty.total_votes, 0);
        assert!(empty.options.iter().all(|o| o.percentage == 0.0));
    }

    #[test]
    fn test_at_uri() {
        let uri = AtUri::parse(P1).unwrap();
        assert_eq!(uri.authority, "did:plc:alice");
        assert_eq!(uri.collection, POLL_COLLECTION);
        assert_eq!(uri.rkey, "p1");
        assert_eq!(uri.to_string(), P1);

        assert!(AtUri::parse("https://bsky.app/a/b").is_err());
        assert!(AtUri::parse("at://did:plc:alice/pt.anto.polls.poll").is_err());
        assert!(AtUri::parse("at://did:plc:alice/pt.anto.polls.poll/p1/extra").is_err());
        assert!(AtUri::parse("at://did:plc:alice//p1").is_err());
        assert!(AtUri::parse("at://did:plc:alice/pt.anto.polls.poll/p\u{0}1").is_err());
    }

    #[test]
    fn test_record_serialization() {
        let record = PollRecord::new("Best cuisine?", vec!["Italian".into(), "Thai".into()], NOW).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["$type"], "pt.anto.polls.poll");
        assert_eq!(value["createdAt"], "2025-03-01T12:00:00Z");
        assert_eq!(value["options"], json!(["Italian", "Thai"]));
    }
}
