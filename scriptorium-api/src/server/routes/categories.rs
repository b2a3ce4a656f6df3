use crate::server::{Result, ServerError, ServerRouter, extract::Json};
use axum::extract::State;
use axum_extra::routing::{RouterExt, TypedPath};
use scriptorium_common::model::{category::Category, tag::Tag};
use scriptorium_db::client::DbClient;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(get_categories)
        .typed_get(get_tags)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/categories", rejection(ServerError))]
struct GetCategoriesPath();

async fn get_categories(
    GetCategoriesPath(): GetCategoriesPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Category>>> {
    Ok(Json(db.fetch_categories().await?))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/tags", rejection(ServerError))]
struct GetTagsPath();

async fn get_tags(
    GetTagsPath(): GetTagsPath,
    State(db): State<Arc<DbClient>>,
) -> Result<Json<Vec<Tag>>> {
    Ok(Json(db.fetch_tags().await?))
}
