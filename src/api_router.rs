use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::activities::configure_activity_api_routes;
use crate::campaigns::configure_campaign_api_routes;
use crate::comments::configure_comment_api_routes;
use crate::leads::configure_lead_api_routes;
use crate::shared::state::AppState;
use crate::tasks::configure_task_api_routes;

pub fn configure_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(configure_campaign_api_routes())
        .merge(configure_lead_api_routes())
        .merge(configure_activity_api_routes())
        .merge(configure_comment_api_routes())
        .merge(configure_task_api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
