use axum::Json;
use common_auth::{CurrentUser, UserIdentity};

/// Returns the bearer-authenticated caller's identity.
pub async fn read_user_me(CurrentUser(user): CurrentUser) -> Json<UserIdentity> {
    Json(user)
}
