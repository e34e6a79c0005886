use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::config::CONFIG;
use crate::db::models::PostStatus;
use crate::state::AppState;
use crate::storage;

type ApiResponse = (StatusCode, Json<Value>);

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> ApiResponse {
    // Unknown status values fall back to an unfiltered listing.
    let status = query.status.as_deref().and_then(PostStatus::parse);
    let limit = query
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(CONFIG.posts_default_limit);

    match state.db.list_posts(status, limit).await {
        Ok(posts) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "count": posts.len(),
                "posts": posts,
            })),
        ),
        Err(err) => {
            error!("Failed to list posts: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to fetch posts" })),
            )
        }
    }
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> ApiResponse {
    match state.db.get_post(post_id).await {
        Ok(Some(post)) => (
            StatusCode::OK,
            Json(json!({ "success": true, "post": post })),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": "Post not found" })),
        ),
        Err(err) => {
            error!("Failed to fetch post {post_id}: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to fetch post" })),
            )
        }
    }
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> ApiResponse {
    let post = match state.db.get_post(post_id).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "success": false, "error": "Post not found" })),
            );
        }
        Err(err) => {
            error!("Failed to fetch post {post_id}: {err:#}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to fetch post" })),
            );
        }
    };

    // Storage cleanup is best-effort; the row goes away regardless.
    for storage_key in [post.storage_key.as_deref(), post.reference_storage_key.as_deref()]
        .into_iter()
        .flatten()
    {
        if let Err(err) = storage::delete_image(storage_key).await {
            error!("Failed to delete stored object {storage_key}: {err:#}");
        }
    }

    match state.db.delete_post(post_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "success": true, "message": "Post deleted successfully" })),
        ),
        Err(err) => {
            error!("Failed to delete post {post_id}: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "Failed to delete post" })),
            )
        }
    }
}
