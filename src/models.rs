// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub cpf: String,
}

/// Yes/no choice of a vote, stored as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteChoice {
    Yes,
    No,
}

impl From<bool> for VoteChoice {
    fn from(value: bool) -> Self {
        if value {
            VoteChoice::Yes
        } else {
            VoteChoice::No
        }
    }
}

impl From<VoteChoice> for bool {
    fn from(choice: VoteChoice) -> Self {
        choice == VoteChoice::Yes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: i64,
    pub vote: VoteChoice,
    pub user_id: i64,
    pub poll_id: i64,
}

/// A voting session. Open or closed is derived from `end_at` at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: i64,
    pub topic: Topic,
    pub end_at: DateTime<Utc>,
    pub votes: Vec<Vote>,
}

#[derive(Debug, Clone)]
pub struct NewTopic {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPoll {
    pub topic_id: i64,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub cpf: String,
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub vote: VoteChoice,
    pub user_id: i64,
    pub poll_id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRequest {
    pub topic_id: Option<i64>,
    pub end_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    pub name: Option<String>,
    pub cpf: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote: Option<VoteChoice>,
    pub user_id: Option<i64>,
    pub poll_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_choice_maps_to_boolean_column() {
        assert_eq!(VoteChoice::from(true), VoteChoice::Yes);
        assert_eq!(VoteChoice::from(false), VoteChoice::No);
        assert!(bool::from(VoteChoice::Yes));
        assert!(!bool::from(VoteChoice::No));
    }

    #[test]
    fn poll_request_reads_camel_case() {
        let req: PollRequest =
            serde_json::from_str(r#"{"topicId": 7, "endAt": "2030-01-01T10:00:00Z"}"#).unwrap();
        assert_eq!(req.topic_id, Some(7));
        assert!(req.end_at.is_some());

        let empty: PollRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.topic_id.is_none());
        assert!(empty.end_at.is_none());
    }

    #[test]
    fn vote_request_reads_uppercase_choice() {
        let req: VoteRequest =
            serde_json::from_str(r#"{"vote": "NO", "userId": 1, "pollId": 2}"#).unwrap();
        assert_eq!(req.vote, Some(VoteChoice::No));
    }
}
