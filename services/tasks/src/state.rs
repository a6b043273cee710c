//! Application state shared across handlers

use common::token::TokenService;

use crate::repositories::TaskRepository;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_service: TokenService,
    pub task_repository: TaskRepository,
}
