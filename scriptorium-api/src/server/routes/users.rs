use crate::server::{Result, ServerError, ServerRouter, auth::CurrentViewer, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use scriptorium_common::{
    media::ImageUrls,
    model::{Id, post::PostFilter, user::UserMarker},
    projection::{PostView, UserSummary},
};
use scriptorium_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_user)
        .typed_get(get_user_posts)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}", rejection(ServerError))]
struct GetUserPath {
    id: Id<UserMarker>,
}

async fn get_user(
    GetUserPath { id }: GetUserPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
) -> Result<Json<UserSummary>> {
    let user = db
        .fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    Ok(Json(UserSummary::project(&user, &urls)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/users/{id}/posts", rejection(ServerError))]
struct GetUserPostsPath {
    id: Id<UserMarker>,
}

async fn get_user_posts(
    GetUserPostsPath { id }: GetUserPostsPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<Vec<PostView>>> {
    db.fetch_user(id)
        .await?
        .ok_or(ServerError::UserByIdNotFound(id))?;

    let filter = PostFilter {
        author: Some(id),
        ..PostFilter::default()
    };
    let posts = db.fetch_posts(&filter).await?;

    Ok(Json(
        posts
            .iter()
            .map(|post| PostView::project(post, viewer, &urls))
            .collect(),
    ))
}
