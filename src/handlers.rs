// handlers.rs
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::{Poll, PollRequest, Topic, TopicRequest, User, UserRequest, Vote, VoteRequest};
use crate::poll::{PollResult, PollStatus};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: PollStatus,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub result: PollResult,
}

/// List every registered member
pub async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.get_users().await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get_user(id).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<UserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.users.save_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(request): AppJson<UserRequest>,
) -> Result<StatusCode, AppError> {
    state.users.update_user(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List topics up for deliberation
pub async fn get_topics(State(state): State<AppState>) -> Result<Json<Vec<Topic>>, AppError> {
    Ok(Json(state.topics.get_topics().await?))
}

pub async fn create_topic(
    State(state): State<AppState>,
    AppJson(request): AppJson<TopicRequest>,
) -> Result<(StatusCode, Json<Topic>), AppError> {
    let topic = state.topics.create_topic(request).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// List polls with their topic and votes
pub async fn get_polls(State(state): State<AppState>) -> Result<Json<Vec<Poll>>, AppError> {
    Ok(Json(state.polls.get_polls().await?))
}

/// Open a poll on a topic
pub async fn create_poll(
    State(state): State<AppState>,
    AppJson(request): AppJson<PollRequest>,
) -> Result<(StatusCode, Json<Poll>), AppError> {
    let poll = state.polls.create_poll(request).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

pub async fn get_poll_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    let status = state.polls.get_status(id).await?;
    Ok(Json(StatusResponse { status }))
}

pub async fn get_poll_result(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<ResultResponse>, AppError> {
    let result = state.polls.get_result(id).await?;
    Ok(Json(ResultResponse { result }))
}

/// Cast a vote
pub async fn create_vote(
    State(state): State<AppState>,
    AppJson(request): AppJson<VoteRequest>,
) -> Result<(StatusCode, Json<Vote>), AppError> {
    let vote = state.votes.create_vote(request).await?;
    Ok((StatusCode::CREATED, Json(vote)))
}
