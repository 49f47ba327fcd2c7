use axum::extract::{Path, Query, State};
use axum::Json;
use common_auth::Principal;
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as};
use uuid::Uuid;

use crate::api_error::{ApiError, ApiResult};
use crate::app::AppState;

const TITLE_MAX: usize = 255;
const DESCRIPTION_MAX: usize = 255;
const LIST_LIMIT_MAX: i64 = 1000;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ItemCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct ItemUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct ItemsPage {
    pub data: Vec<Item>,
    pub count: i64,
}

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct Message {
    pub message: String,
}

fn validate_title(title: &str) -> ApiResult<()> {
    if title.is_empty() {
        return Err(ApiError::Unprocessable(
            "title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(ApiError::Unprocessable(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> ApiResult<()> {
    if let Some(value) = description {
        if value.chars().count() > DESCRIPTION_MAX {
            return Err(ApiError::Unprocessable(format!(
                "description must be at most {DESCRIPTION_MAX} characters"
            )));
        }
    }
    Ok(())
}

pub async fn list_items(
    State(state): State<AppState>,
    _principal: Principal,
    Query(page): Query<Pagination>,
) -> ApiResult<Json<ItemsPage>> {
    let skip = page.skip.unwrap_or(0).max(0);
    let limit = page.limit.unwrap_or(100).clamp(0, LIST_LIMIT_MAX);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&state.db)
        .await?;

    let data = query_as::<_, Item>(
        "SELECT id, title, description, owner_id FROM items ORDER BY id OFFSET $1 LIMIT $2",
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ItemsPage { data, count }))
}

pub async fn read_item(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Item>> {
    let item =
        query_as::<_, Item>("SELECT id, title, description, owner_id FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(ApiError::item_not_found)?;

    Ok(Json(item))
}

pub async fn create_item(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<ItemCreate>,
) -> ApiResult<Json<Item>> {
    validate_title(&body.title)?;
    validate_description(body.description.as_deref())?;

    // Service (API key) writes carry no owner; bearer writes are stamped
    // with the authenticated user's id.
    let owner_id = principal.user().map(|user| user.id);

    let item = query_as::<_, Item>(
        "INSERT INTO items (id, title, description, owner_id) VALUES ($1, $2, $3, $4)
         RETURNING id, title, description, owner_id",
    )
    .bind(Uuid::new_v4())
    .bind(&body.title)
    .bind(&body.description)
    .bind(owner_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(body): Json<ItemUpdate>,
) -> ApiResult<Json<Item>> {
    if let Some(title) = body.title.as_deref() {
        validate_title(title)?;
    }
    validate_description(body.description.as_deref())?;

    // Absent fields keep their stored values.
    let item = query_as::<_, Item>(
        "UPDATE items SET title = COALESCE($1, title), description = COALESCE($2, description)
         WHERE id = $3
         RETURNING id, title, description, owner_id",
    )
    .bind(body.title)
    .bind(body.description)
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(ApiError::item_not_found)?;

    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    let result = query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::item_not_found());
    }

    Ok(Json(Message {
        message: "Item deleted successfully".to_string(),
    }))
}
