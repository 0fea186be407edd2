use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{PollStore, StoreResult, TopicStore, UserStore, VoteStore};
use crate::error::StoreError;
use crate::models::{NewPoll, NewTopic, NewUser, NewVote, Poll, Topic, User, Vote};

#[derive(Debug, Clone, Copy)]
struct PollRecord {
    topic_id: i64,
    end_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    topics: BTreeMap<i64, Topic>,
    polls: BTreeMap<i64, PollRecord>,
    users: BTreeMap<i64, User>,
    votes: BTreeMap<i64, Vote>,
    next_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn load_poll(&self, id: i64, record: &PollRecord) -> Option<Poll> {
        let topic = self.topics.get(&record.topic_id)?.clone();
        let votes = self
            .votes
            .values()
            .filter(|vote| vote.poll_id == id)
            .cloned()
            .collect();

        Some(Poll {
            id,
            topic,
            end_at: record.end_at,
            votes,
        })
    }

    fn cpf_taken(&self, cpf: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|user| user.cpf == cpf && Some(user.id) != except)
    }
}

/// Process-local store with the same observable behaviour as [`super::PgStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TopicStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Topic>> {
        Ok(self.state.lock().await.topics.get(&id).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<Topic>> {
        Ok(self.state.lock().await.topics.values().cloned().collect())
    }

    async fn save(&self, topic: NewTopic) -> StoreResult<Topic> {
        let mut state = self.state.lock().await;
        let topic = Topic {
            id: state.next_id(),
            name: topic.name,
            description: topic.description,
        };
        state.topics.insert(topic.id, topic.clone());

        Ok(topic)
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Poll>> {
        let state = self.state.lock().await;

        Ok(state
            .polls
            .get(&id)
            .and_then(|record| state.load_poll(id, record)))
    }

    async fn find_all(&self) -> StoreResult<Vec<Poll>> {
        let state = self.state.lock().await;

        Ok(state
            .polls
            .iter()
            .filter_map(|(id, record)| state.load_poll(*id, record))
            .collect())
    }

    async fn save(&self, poll: NewPoll) -> StoreResult<Poll> {
        let mut state = self.state.lock().await;
        if !state.topics.contains_key(&poll.topic_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "topic {} does not exist",
                poll.topic_id
            )));
        }

        let id = state.next_id();
        let record = PollRecord {
            topic_id: poll.topic_id,
            end_at: poll.end_at,
        };
        state.polls.insert(id, record);

        state.load_poll(id, &record).ok_or_else(|| {
            StoreError::ForeignKeyViolation(format!("topic {} does not exist", poll.topic_id))
        })
    }

    async fn find_all_opened_polls_by_topic(
        &self,
        topic: &Topic,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<Poll>> {
        let state = self.state.lock().await;

        Ok(state
            .polls
            .iter()
            .filter(|(_, record)| record.topic_id == topic.id && record.end_at > as_of)
            .filter_map(|(id, record)| state.load_poll(*id, record))
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_cpf(&self, cpf: &str) -> StoreResult<Option<User>> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|user| user.cpf == cpf)
            .cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<User>> {
        Ok(self.state.lock().await.users.values().cloned().collect())
    }

    async fn save(&self, user: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state.cpf_taken(&user.cpf, None) {
            return Err(StoreError::UniqueViolation(format!(
                "cpf {} already exists",
                user.cpf
            )));
        }

        let user = User {
            id: state.next_id(),
            name: user.name,
            cpf: user.cpf,
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update(&self, id: i64, user: NewUser) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        if state.cpf_taken(&user.cpf, Some(id)) {
            return Err(StoreError::UniqueViolation(format!(
                "cpf {} already exists",
                user.cpf
            )));
        }

        Ok(state.users.get_mut(&id).map(|stored| {
            stored.name = user.name;
            stored.cpf = user.cpf;
            stored.clone()
        }))
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let removed = state.users.remove(&id).is_some();
        if removed {
            state.votes.retain(|_, vote| vote.user_id != id);
        }

        Ok(removed)
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn save(&self, vote: NewVote) -> StoreResult<Vote> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&vote.user_id) || !state.polls.contains_key(&vote.poll_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "user {} or poll {} does not exist",
                vote.user_id, vote.poll_id
            )));
        }

        let vote = Vote {
            id: state.next_id(),
            vote: vote.vote,
            user_id: vote.user_id,
            poll_id: vote.poll_id,
        };
        state.votes.insert(vote.id, vote.clone());

        Ok(vote)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::VoteChoice;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, minute, 0).unwrap()
    }

    async fn topic(store: &MemoryStore, name: &str) -> Topic {
        TopicStore::save(
            store,
            NewTopic {
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn opened_polls_use_strict_end_comparison() {
        let store = MemoryStore::new();
        let topic = topic(&store, "budget").await;
        PollStore::save(
            &store,
            NewPoll {
                topic_id: topic.id,
                end_at: at(10),
            },
        )
        .await
        .unwrap();

        let before = store
            .find_all_opened_polls_by_topic(&topic, at(10) - Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(before.len(), 1);

        let exactly = store
            .find_all_opened_polls_by_topic(&topic, at(10))
            .await
            .unwrap();
        assert!(exactly.is_empty());
    }

    #[tokio::test]
    async fn opened_polls_are_scoped_to_topic() {
        let store = MemoryStore::new();
        let budget = topic(&store, "budget").await;
        let board = topic(&store, "board").await;
        PollStore::save(
            &store,
            NewPoll {
                topic_id: budget.id,
                end_at: at(30),
            },
        )
        .await
        .unwrap();

        let open = store
            .find_all_opened_polls_by_topic(&board, at(0))
            .await
            .unwrap();
        assert!(open.is_empty());
    }

    #[tokio::test]
    async fn loaded_poll_carries_its_votes() {
        let store = MemoryStore::new();
        let topic = topic(&store, "budget").await;
        let poll = PollStore::save(
            &store,
            NewPoll {
                topic_id: topic.id,
                end_at: at(30),
            },
        )
        .await
        .unwrap();
        let user = UserStore::save(
            &store,
            NewUser {
                name: "Ana".into(),
                cpf: "00000000001".into(),
            },
        )
        .await
        .unwrap();

        VoteStore::save(
            &store,
            NewVote {
                vote: VoteChoice::Yes,
                user_id: user.id,
                poll_id: poll.id,
            },
        )
        .await
        .unwrap();

        let loaded = PollStore::find_by_id(&store, poll.id).await.unwrap().unwrap();
        assert_eq!(loaded.topic, topic);
        assert_eq!(loaded.votes.len(), 1);
        assert_eq!(loaded.votes[0].vote, VoteChoice::Yes);
    }

    #[tokio::test]
    async fn duplicate_cpf_is_rejected() {
        let store = MemoryStore::new();
        let user = NewUser {
            name: "Ana".into(),
            cpf: "00000000001".into(),
        };
        UserStore::save(&store, user.clone()).await.unwrap();

        let err = UserStore::save(&store, user).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }
}
