pub mod circles;
pub mod directory;
pub mod echo;
pub mod error;
pub mod journal;
pub mod providers;
pub mod session;
pub mod state;
pub mod users;
pub mod validate;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use providers::{ChatProvider, ProviderKind, build_provider};
pub use session::SessionSettings;
pub use state::{AppState, AppStateInner};

/// Every route the service exposes. User-scoped `/api/*` routes pass through
/// session decoding; the Echo proxy and the resource directory do not.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/echo", post(echo::reply_to_chat))
        .route("/resources", get(directory::resources));

    let session_routes = Router::new()
        .route("/users", get(users::get_user).post(users::create_user))
        .route(
            "/journal/entries",
            get(journal::list_entries)
                .post(journal::create_entry)
                .delete(journal::delete_entry),
        )
        .route("/circles", get(circles::list_circles))
        .route("/circles/join", post(circles::join_circle))
        .route(
            "/circles/{id}/messages",
            get(circles::list_messages).post(circles::send_message),
        )
        .route("/echo/save", post(echo::save_conversation))
        .route("/echo/history", get(echo::history))
        .layer(middleware::from_fn_with_state(state.clone(), session::attach_session));

    let api_routes = public_routes.merge(session_routes).with_state(state);

    Router::new()
        .route("/health", get(directory::health))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
