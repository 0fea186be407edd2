use std::sync::Arc;

use crate::clock::Clock;
use crate::poll::PollService;
use crate::services::{TopicService, UserService, VoteService};
use crate::store::{PollStore, TopicStore, UserStore, VoteStore};

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub polls: PollService,
    pub topics: TopicService,
    pub users: UserService,
    pub votes: VoteService,
}

impl AppState {
    pub fn new<S>(store: S, clock: Arc<dyn Clock>) -> Self
    where
        S: TopicStore + PollStore + UserStore + VoteStore + 'static,
    {
        let store = Arc::new(store);

        Self {
            polls: PollService::new(store.clone(), store.clone(), clock),
            topics: TopicService::new(store.clone()),
            users: UserService::new(store.clone()),
            votes: VoteService::new(store.clone(), store.clone(), store),
        }
    }
}
