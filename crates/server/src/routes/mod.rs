use axum::Router;

use crate::AppState;

pub mod activities;
pub mod agenda;
pub mod auth;
pub mod preferences;
pub mod weather;

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(auth::router(state))
        .merge(activities::router(state))
        .merge(preferences::router(state))
        .merge(agenda::router(state))
        .merge(weather::router(state))
}
