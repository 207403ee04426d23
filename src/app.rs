use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/users/:user_id", get(handlers::user_page))
        .route("/users/:user_id/reset", post(handlers::reset_form))
        .route("/users/:user_id/continue", post(handlers::continue_form))
        .route("/api/users", post(handlers::create_user))
        .route(
            "/api/users/:user_id",
            get(handlers::get_user).patch(handlers::update_user),
        )
        .route("/api/users/:user_id/partner", post(handlers::link_partner))
        .route(
            "/api/users/:user_id/activities",
            get(handlers::list_activities).post(handlers::add_activities),
        )
        .route(
            "/api/users/:user_id/activities/:activity_id",
            patch(handlers::update_activity).delete(handlers::delete_activity),
        )
        .route("/api/users/:user_id/completions", post(handlers::log_completion))
        .route(
            "/api/users/:user_id/completions/:activity_id",
            delete(handlers::remove_completion),
        )
        .route("/api/users/:user_id/today", get(handlers::get_today))
        .route("/api/users/:user_id/stats", get(handlers::get_stats))
        .route("/api/users/:user_id/skip-prompt", get(handlers::get_skip_prompt))
        .route("/api/users/:user_id/skip-prompt/reset", post(handlers::reset))
        .route("/api/users/:user_id/skip-prompt/continue", post(handlers::continue_program))
        .route("/api/program/:day", get(handlers::get_program_day))
        .with_state(state)
}
