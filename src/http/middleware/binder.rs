//! Request context binder.
//! Makes the dispatcher reachable from handlers without global state.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::pool::Dispatcher;

/// Attach the dispatcher to the request before the handler runs.
///
/// Handlers read it back with `Extension<Dispatcher>`.
pub async fn bind_dispatcher(
    State(dispatcher): State<Dispatcher>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    req.extensions_mut().insert(dispatcher);
    next.run(req).await
}
