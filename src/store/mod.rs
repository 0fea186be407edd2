//! Storage interfaces the services depend on.
//!
//! `PgStore` backs the running server; `MemoryStore` keeps everything in
//! process and is used when no database is configured and by the tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{NewPoll, NewTopic, NewUser, NewVote, Poll, Topic, User, Vote};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TopicStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Topic>>;

    async fn find_all(&self) -> StoreResult<Vec<Topic>>;

    async fn save(&self, topic: NewTopic) -> StoreResult<Topic>;
}

#[async_trait]
pub trait PollStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Poll>>;

    async fn find_all(&self) -> StoreResult<Vec<Poll>>;

    async fn save(&self, poll: NewPoll) -> StoreResult<Poll>;

    /// Polls of `topic` whose `end_at` is strictly after `as_of`.
    async fn find_all_opened_polls_by_topic(
        &self,
        topic: &Topic,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<Poll>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_by_cpf(&self, cpf: &str) -> StoreResult<Option<User>>;

    async fn find_all(&self) -> StoreResult<Vec<User>>;

    async fn save(&self, user: NewUser) -> StoreResult<User>;

    async fn update(&self, id: i64, user: NewUser) -> StoreResult<Option<User>>;

    /// Returns whether a row was removed.
    async fn delete_by_id(&self, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn save(&self, vote: NewVote) -> StoreResult<Vote>;
}
