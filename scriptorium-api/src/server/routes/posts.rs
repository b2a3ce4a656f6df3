use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, CurrentViewer},
    extract::{Json, Query},
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use scriptorium_common::{
    media::ImageUrls,
    model::{
        Id,
        post::{PostFilter, PostForm, PostInput, PostMarker, field_error},
        viewer::Viewer,
    },
    projection::PostView,
};
use scriptorium_db::client::{DbClient, MissingReferences};
use serde::Deserialize;
use std::sync::Arc;
use validator::ValidationErrors;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
        .typed_post(like_post)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts", rejection(ServerError))]
struct PostsPath();

async fn get_posts(
    PostsPath(): PostsPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
    CurrentViewer(viewer): CurrentViewer,
    Query(filter): Query<PostFilter>,
) -> Result<Json<Vec<PostView>>> {
    let posts = db.fetch_posts(&filter).await?;

    Ok(Json(
        posts
            .iter()
            .map(|post| PostView::project(post, viewer, &urls))
            .collect(),
    ))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
    CurrentViewer(viewer): CurrentViewer,
) -> Result<Json<PostView>> {
    if !db.record_view(id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(PostView::project(&post, viewer, &urls)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/create", rejection(ServerError))]
struct CreatePostPath();

async fn create_post(
    CreatePostPath(): CreatePostPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
    user: AuthenticatedUser,
    Json(form): Json<PostForm>,
) -> Result<(StatusCode, Json<PostView>)> {
    let input = validate_post(&db, form).await?;
    let id = db.create_post(&input, user.user_id()).await?;

    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    let viewer = Viewer::Authenticated(user.user_id());

    Ok((
        StatusCode::CREATED,
        Json(PostView::project(&post, viewer, &urls)),
    ))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
    user: AuthenticatedUser,
    Json(form): Json<PostForm>,
) -> Result<Json<PostView>> {
    ensure_author(&db, id, user).await?;

    let input = validate_post(&db, form).await?;
    if !db.update_post(id, &input).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    let viewer = Viewer::Authenticated(user.user_id());

    Ok(Json(PostView::project(&post, viewer, &urls)))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(db): State<Arc<DbClient>>,
    user: AuthenticatedUser,
) -> Result<StatusCode> {
    ensure_author(&db, id, user).await?;

    if !db.delete_post(id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/like", rejection(ServerError))]
struct LikePostPath {
    id: Id<PostMarker>,
}

async fn like_post(
    LikePostPath { id }: LikePostPath,
    State(db): State<Arc<DbClient>>,
    State(urls): State<Arc<ImageUrls>>,
    user: AuthenticatedUser,
) -> Result<Json<PostView>> {
    db.fetch_post_author(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    db.toggle_like(id, user.user_id()).await?;

    let post = db
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    let viewer = Viewer::Authenticated(user.user_id());

    Ok(Json(PostView::project(&post, viewer, &urls)))
}

async fn ensure_author(db: &DbClient, id: Id<PostMarker>, user: AuthenticatedUser) -> Result<()> {
    let author = db
        .fetch_post_author(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    if author == user.user_id() {
        Ok(())
    } else {
        Err(ServerError::NotPostAuthor(id))
    }
}

/// Field checks first, then whether category and tags exist. Nothing is
/// written unless both pass.
async fn validate_post(db: &DbClient, form: PostForm) -> Result<PostInput> {
    let input = form.into_input()?;

    let missing = db.missing_references(input.category, &input.tags).await?;
    match reference_errors(missing) {
        None => Ok(input),
        Some(errors) => Err(errors.into()),
    }
}

/// Field errors for references that do not exist, `None` if all exist.
fn reference_errors(missing: MissingReferences) -> Option<ValidationErrors> {
    if missing.is_empty() {
        return None;
    }

    let does_not_exist = |id: i64| {
        field_error(
            "does_not_exist",
            format!("Invalid pk \"{id}\" - object does not exist."),
        )
    };

    let mut errors = ValidationErrors::new();
    if let Some(category) = missing.category {
        errors.add("category", does_not_exist(category.get()));
    }
    for tag in missing.tags {
        errors.add("tags", does_not_exist(tag.get()));
    }

    Some(errors)
}
