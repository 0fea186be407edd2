use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{PollStore, StoreResult, TopicStore, UserStore, VoteStore};
use crate::models::{NewPoll, NewTopic, NewUser, NewVote, Poll, Topic, User, Vote};

const POLL_COLUMNS: &str = "p.id, p.end_at, t.id AS topic_id, t.name AS topic_name, \
                            t.description AS topic_description";

#[derive(sqlx::FromRow)]
struct PollRow {
    id: i64,
    end_at: DateTime<Utc>,
    topic_id: i64,
    topic_name: String,
    topic_description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    id: i64,
    vote: bool,
    user_id: i64,
    poll_id: i64,
}

impl From<VoteRow> for Vote {
    fn from(row: VoteRow) -> Self {
        Vote {
            id: row.id,
            vote: row.vote.into(),
            user_id: row.user_id,
            poll_id: row.poll_id,
        }
    }
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attaches each poll's votes with a single extra query.
    async fn with_votes(&self, rows: Vec<PollRow>) -> StoreResult<Vec<Poll>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let votes = sqlx::query_as::<_, VoteRow>(
            "SELECT id, vote, user_id, poll_id FROM votes WHERE poll_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_poll: HashMap<i64, Vec<Vote>> = HashMap::new();
        for vote in votes {
            by_poll.entry(vote.poll_id).or_default().push(vote.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Poll {
                id: row.id,
                votes: by_poll.remove(&row.id).unwrap_or_default(),
                end_at: row.end_at,
                topic: Topic {
                    id: row.topic_id,
                    name: row.topic_name,
                    description: row.topic_description,
                },
            })
            .collect())
    }
}

#[async_trait]
impl TopicStore for PgStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(
            "SELECT id, name, description FROM topics WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(topic)
    }

    async fn find_all(&self) -> StoreResult<Vec<Topic>> {
        let topics =
            sqlx::query_as::<_, Topic>("SELECT id, name, description FROM topics ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(topics)
    }

    async fn save(&self, topic: NewTopic) -> StoreResult<Topic> {
        let topic = sqlx::query_as::<_, Topic>(
            "INSERT INTO topics (name, description) VALUES ($1, $2)
             RETURNING id, name, description",
        )
        .bind(topic.name)
        .bind(topic.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(topic)
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Poll>> {
        let row = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls p JOIN topics t ON t.id = p.topic_id WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => Ok(self.with_votes(vec![row]).await?.pop()),
        }
    }

    async fn find_all(&self) -> StoreResult<Vec<Poll>> {
        let rows = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls p JOIN topics t ON t.id = p.topic_id ORDER BY p.id"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.with_votes(rows).await
    }

    async fn save(&self, poll: NewPoll) -> StoreResult<Poll> {
        let row = sqlx::query_as::<_, PollRow>(&format!(
            "WITH p AS (
                 INSERT INTO polls (topic_id, end_at) VALUES ($1, $2)
                 RETURNING id, topic_id, end_at
             )
             SELECT {POLL_COLUMNS} FROM p JOIN topics t ON t.id = p.topic_id"
        ))
        .bind(poll.topic_id)
        .bind(poll.end_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Poll {
            id: row.id,
            end_at: row.end_at,
            votes: Vec::new(),
            topic: Topic {
                id: row.topic_id,
                name: row.topic_name,
                description: row.topic_description,
            },
        })
    }

    async fn find_all_opened_polls_by_topic(
        &self,
        topic: &Topic,
        as_of: DateTime<Utc>,
    ) -> StoreResult<Vec<Poll>> {
        let rows = sqlx::query_as::<_, PollRow>(&format!(
            "SELECT {POLL_COLUMNS} FROM polls p JOIN topics t ON t.id = p.topic_id
             WHERE p.topic_id = $1 AND p.end_at > $2 ORDER BY p.id"
        ))
        .bind(topic.id)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await?;

        self.with_votes(rows).await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, cpf FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_cpf(&self, cpf: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, cpf FROM users WHERE cpf = $1")
            .bind(cpf)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_all(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT id, name, cpf FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn save(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, cpf) VALUES ($1, $2) RETURNING id, name, cpf",
        )
        .bind(user.name)
        .bind(user.cpf)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: i64, user: NewUser) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = $2, cpf = $3 WHERE id = $1 RETURNING id, name, cpf",
        )
        .bind(id)
        .bind(user.name)
        .bind(user.cpf)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_by_id(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VoteStore for PgStore {
    async fn save(&self, vote: NewVote) -> StoreResult<Vote> {
        let row = sqlx::query_as::<_, VoteRow>(
            "INSERT INTO votes (vote, user_id, poll_id) VALUES ($1, $2, $3)
             RETURNING id, vote, user_id, poll_id",
        )
        .bind(bool::from(vote.vote))
        .bind(vote.user_id)
        .bind(vote.poll_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }
}
