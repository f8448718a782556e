use shared::{
    domain::{AccountStatus, Role, UserId, UserRecord, YesNo},
    error::ApiError,
    protocol::{ListMeta, MutationResponse, NewUser, UserListQuery, UserListResponse, UserPatch},
};
use storage::{EmailTaken, Storage};
use tracing::{error, info};

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub fn users_route() -> &'static str {
    "/users"
}

pub fn user_route() -> &'static str {
    "/users/:user_id"
}

pub async fn list_users(
    ctx: &ApiContext,
    mut query: UserListQuery,
) -> Result<UserListResponse, ApiError> {
    if query.limit == 0 {
        return Err(ApiError::validation("limit must be positive"));
    }
    query.limit = query.limit.min(MAX_PAGE_SIZE);
    query.page = query.page.max(1);

    let page = ctx.storage.list_users(&query).await.map_err(internal)?;
    Ok(UserListResponse {
        data: page.users,
        meta: ListMeta {
            page: query.page,
            limit: query.limit,
            total: page.total,
        },
    })
}

pub async fn get_user(ctx: &ApiContext, user_id: &UserId) -> Result<UserRecord, ApiError> {
    ctx.storage
        .get_user(user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::not_found(format!("user {user_id} not found")))
}

/// Applies a partial update. Requests that would change nothing, or that
/// target a soft-deleted account, are answered with `success: false` rather
/// than an HTTP error.
pub async fn update_user(
    ctx: &ApiContext,
    user_id: &UserId,
    patch: UserPatch,
) -> Result<MutationResponse, ApiError> {
    let current = get_user(ctx, user_id).await?;
    if current.is_delete == YesNo::Yes {
        return Ok(MutationResponse::rejected("user has been deleted"));
    }
    if patch.is_empty() {
        return Ok(MutationResponse::rejected("nothing to update"));
    }
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }
    if let Some(status) = patch.status {
        validate_status(status)?;
    }

    let updated = ctx
        .storage
        .update_user(user_id, &patch)
        .await
        .map_err(write_failure)?
        .ok_or_else(|| ApiError::not_found(format!("user {user_id} not found")))?;

    if let Some(status) = patch.status {
        info!(user_id = %user_id, from = %current.status, to = %status, "account status changed");
    }
    Ok(MutationResponse::ok("user updated", updated))
}

pub async fn create_user(ctx: &ApiContext, new_user: NewUser) -> Result<MutationResponse, ApiError> {
    if new_user.role == Role::Unknown {
        return Err(ApiError::validation("role must be one of admin, trainer, seller, student"));
    }
    validate_email(&new_user.email)?;
    if new_user.name.first_name.trim().is_empty() || new_user.name.last_name.trim().is_empty() {
        return Err(ApiError::validation("first and last name are required"));
    }
    validate_status(new_user.status)?;

    let created = ctx
        .storage
        .create_user(&new_user)
        .await
        .map_err(write_failure)?;
    info!(user_id = %created.id, role = %created.role, "user created");
    Ok(MutationResponse::ok("user created", created))
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::validation(format!("invalid email '{email}'"))),
    }
}

fn validate_status(status: AccountStatus) -> Result<(), ApiError> {
    if status.is_known() {
        Ok(())
    } else {
        Err(ApiError::validation(
            "status must be one of active, deactivate, blocked",
        ))
    }
}

fn write_failure(err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<EmailTaken>() {
        Some(taken) => ApiError::validation(taken.to_string()),
        None => internal(err),
    }
}

/// Storage detail goes to the log only; clients get a fixed message.
pub fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "storage request failed");
    ApiError::internal("internal server error")
}
