// services.rs
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, ErrorMessage, StoreError};
use crate::models::{
    NewTopic, NewUser, NewVote, Topic, TopicRequest, User, UserRequest, Vote, VoteRequest,
};
use crate::store::{PollStore, TopicStore, UserStore, VoteStore};

/// Present and not only whitespace.
fn required(value: Option<String>, missing: ErrorMessage) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::MissingParameter(missing)),
    }
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn get_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.find_all().await?)
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AppError::ResourceNotFound(ErrorMessage::UserNotFound))
    }

    pub async fn save_user(&self, request: UserRequest) -> Result<User, AppError> {
        let user = Self::validate(request)?;
        self.ensure_cpf_free(&user.cpf, None).await?;

        let user = self.users.save(user).await.map_err(duplicate_cpf)?;
        info!(user_id = user.id, "User registered");

        Ok(user)
    }

    pub async fn update_user(&self, id: i64, request: UserRequest) -> Result<User, AppError> {
        self.get_user(id).await?;

        let user = Self::validate(request)?;
        self.ensure_cpf_free(&user.cpf, Some(id)).await?;

        self.users
            .update(id, user)
            .await
            .map_err(duplicate_cpf)?
            .ok_or(AppError::ResourceNotFound(ErrorMessage::UserNotFound))
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        if !self.users.delete_by_id(id).await? {
            return Err(AppError::ResourceNotFound(ErrorMessage::UserNotFound));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }

    fn validate(request: UserRequest) -> Result<NewUser, AppError> {
        Ok(NewUser {
            name: required(request.name, ErrorMessage::RequiredNameField)?,
            cpf: required(request.cpf, ErrorMessage::RequiredCpfField)?,
        })
    }

    async fn ensure_cpf_free(&self, cpf: &str, owner: Option<i64>) -> Result<(), AppError> {
        match self.users.find_by_cpf(cpf).await? {
            Some(existing) if Some(existing.id) != owner => {
                debug!(user_id = existing.id, "Cpf already registered");
                Err(AppError::DuplicateRecord(ErrorMessage::DuplicateCpf))
            }
            _ => Ok(()),
        }
    }
}

/// Another request may register the same cpf between check and insert.
fn duplicate_cpf(e: StoreError) -> AppError {
    match e {
        StoreError::UniqueViolation(_) => AppError::DuplicateRecord(ErrorMessage::DuplicateCpf),
        other => AppError::Store(other),
    }
}

#[derive(Clone)]
pub struct TopicService {
    topics: Arc<dyn TopicStore>,
}

impl TopicService {
    pub fn new(topics: Arc<dyn TopicStore>) -> Self {
        Self { topics }
    }

    pub async fn get_topics(&self) -> Result<Vec<Topic>, AppError> {
        Ok(self.topics.find_all().await?)
    }

    pub async fn create_topic(&self, request: TopicRequest) -> Result<Topic, AppError> {
        let name = required(request.name, ErrorMessage::RequiredNameField)?;

        let topic = self
            .topics
            .save(NewTopic {
                name,
                description: request.description,
            })
            .await?;
        info!(topic_id = topic.id, "Topic created");

        Ok(topic)
    }
}

/// Records votes. A member may vote more than once and closed polls still
/// accept votes; the tally counts all of them.
#[derive(Clone)]
pub struct VoteService {
    votes: Arc<dyn VoteStore>,
    users: Arc<dyn UserStore>,
    polls: Arc<dyn PollStore>,
}

impl VoteService {
    pub fn new(
        votes: Arc<dyn VoteStore>,
        users: Arc<dyn UserStore>,
        polls: Arc<dyn PollStore>,
    ) -> Self {
        Self {
            votes,
            users,
            polls,
        }
    }

    pub async fn create_vote(&self, request: VoteRequest) -> Result<Vote, AppError> {
        let vote = request
            .vote
            .ok_or(AppError::MissingParameter(ErrorMessage::RequiredVoteField))?;
        let user_id = request
            .user_id
            .ok_or(AppError::MissingParameter(ErrorMessage::RequiredUserField))?;
        let poll_id = request
            .poll_id
            .ok_or(AppError::MissingParameter(ErrorMessage::RequiredPollField))?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(ErrorMessage::UserNotFound));
        }
        if self.polls.find_by_id(poll_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(ErrorMessage::PollNotFound));
        }

        let vote = self
            .votes
            .save(NewVote {
                vote,
                user_id,
                poll_id,
            })
            .await?;
        debug!(vote_id = vote.id, poll_id, user_id, "Vote recorded");

        Ok(vote)
    }
}
