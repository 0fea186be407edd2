// src/poll.rs
//! Poll lifecycle: creation rules and the derived status/result views.
//!
//! Nothing about a poll's state is stored besides its `end_at`. Whether it is
//! open and how it ended are computed on every read against the injected
//! [`Clock`].
//!
//! The open-poll check and the insert in [`PollService::create_poll`] are two
//! separate store calls with no lock between them, so two concurrent requests
//! for the same topic can both succeed.

use std::{cmp::Ordering, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{AppError, ErrorMessage};
use crate::models::{NewPoll, Poll, PollRequest, Topic, Vote, VoteChoice};
use crate::store::{PollStore, TopicStore};

/// Lifetime of a poll created without an explicit end.
pub const DEFAULT_POLL_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    Open,
    Closed,
}

impl PollStatus {
    /// A poll is still open at the exact instant it ends.
    pub fn at(end_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now > end_at {
            PollStatus::Closed
        } else {
            PollStatus::Open
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollResult {
    Approved,
    Disapproved,
    Tie,
}

impl PollResult {
    /// Counts every vote, regardless of voter or of when it was cast.
    pub fn tally(votes: &[Vote]) -> Self {
        let upvotes = votes.iter().filter(|v| v.vote == VoteChoice::Yes).count();
        let downvotes = votes.iter().filter(|v| v.vote == VoteChoice::No).count();

        match upvotes.cmp(&downvotes) {
            Ordering::Greater => PollResult::Approved,
            Ordering::Less => PollResult::Disapproved,
            Ordering::Equal => PollResult::Tie,
        }
    }
}

#[derive(Clone)]
pub struct PollService {
    polls: Arc<dyn PollStore>,
    topics: Arc<dyn TopicStore>,
    clock: Arc<dyn Clock>,
}

impl PollService {
    pub fn new(
        polls: Arc<dyn PollStore>,
        topics: Arc<dyn TopicStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            polls,
            topics,
            clock,
        }
    }

    pub async fn get_polls(&self) -> Result<Vec<Poll>, AppError> {
        Ok(self.polls.find_all().await?)
    }

    /// Validates and stores a new poll. The first failing rule wins:
    /// topic given, topic exists, no open poll on it, end not in the past.
    pub async fn create_poll(&self, request: PollRequest) -> Result<Poll, AppError> {
        let topic_id = request
            .topic_id
            .ok_or(AppError::MissingParameter(ErrorMessage::RequiredTopicField))?;

        let topic = self.find_topic(topic_id).await?;

        let now = self.clock.now();
        self.ensure_no_open_poll(&topic, now).await?;

        let end_at = request
            .end_at
            .unwrap_or_else(|| now + Duration::seconds(DEFAULT_POLL_SECONDS));

        if end_at < now {
            debug!(topic_id, %end_at, "Rejected poll ending in the past");
            return Err(AppError::InvalidParameter(ErrorMessage::PollInPast));
        }

        let poll = self
            .polls
            .save(NewPoll {
                topic_id: topic.id,
                end_at,
            })
            .await?;

        info!(poll_id = poll.id, topic_id, %end_at, "Poll opened");

        Ok(poll)
    }

    pub async fn get_status(&self, poll_id: i64) -> Result<PollStatus, AppError> {
        let poll = self.find_poll(poll_id).await?;

        Ok(PollStatus::at(poll.end_at, self.clock.now()))
    }

    pub async fn get_result(&self, poll_id: i64) -> Result<PollResult, AppError> {
        let poll = self.find_poll(poll_id).await?;

        Ok(PollResult::tally(&poll.votes))
    }

    async fn find_poll(&self, poll_id: i64) -> Result<Poll, AppError> {
        self.polls
            .find_by_id(poll_id)
            .await?
            .ok_or(AppError::ResourceNotFound(ErrorMessage::PollNotFound))
    }

    async fn find_topic(&self, topic_id: i64) -> Result<Topic, AppError> {
        self.topics
            .find_by_id(topic_id)
            .await?
            .ok_or(AppError::ResourceNotFound(ErrorMessage::TopicNotFound))
    }

    async fn ensure_no_open_poll(&self, topic: &Topic, now: DateTime<Utc>) -> Result<(), AppError> {
        let open = self.polls.find_all_opened_polls_by_topic(topic, now).await?;
        if !open.is_empty() {
            debug!(topic_id = topic.id, open = open.len(), "Topic already has a running poll");
            return Err(AppError::InvalidParameter(
                ErrorMessage::PollWithTopicAlreadyRunning,
            ));
        }

        Ok(())
    }
}
