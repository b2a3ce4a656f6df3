use crate::server::ServerRouter;
use axum::Router;

mod categories;
mod posts;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(users::routes())
        .merge(categories::routes())
}
