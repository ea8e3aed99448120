use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use crate::{
    AppState,
    error::AppError,
    store::{ACCOUNTS_COLLECTION, Document},
    utils::{Claims, generate_token, hash_password, verify_password},
};

use super::model::{
    Account, LoginRequest, LoginResponse, ProtectedResponse, RegisterRequest, RegisterResponse,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.password != req.confirm_password {
        return Err(AppError::PasswordMismatch);
    }

    // 邮箱、用户名各查一次再写入；两次检查与写入之间存在并发窗口
    let by_email = state
        .store
        .find_by_field(ACCOUNTS_COLLECTION, "email", &req.email)
        .await
        .map_err(|err| AppError::upstream("Failed to create account", err))?;
    if !by_email.is_empty() {
        return Err(AppError::conflict("Email already exists"));
    }

    let by_name = state
        .store
        .find_by_field(ACCOUNTS_COLLECTION, "name", &req.name)
        .await
        .map_err(|err| AppError::upstream("Failed to create account", err))?;
    if !by_name.is_empty() {
        return Err(AppError::conflict("Username already taken"));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|err| AppError::upstream("Failed to create account", err))?;

    let account = Account {
        name: req.name,
        email: req.email,
        password_hash,
        role: "user".to_string(),
    };
    let document = serde_json::to_value(&account)
        .map_err(|err| AppError::upstream("Failed to create account", err))?;
    let id = state
        .store
        .add(ACCOUNTS_COLLECTION, &document)
        .await
        .map_err(|err| {
            error!("Account insert failed: {}", err);
            AppError::upstream("Failed to create account", err)
        })?;

    // 注册令牌只携带ID与邮箱
    let token = generate_token(&id, &account.email, None, &state.config)
        .map_err(|err| AppError::upstream("Failed to create account", err))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created".to_string(),
            token,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let matches = state
        .store
        .find_by_field(ACCOUNTS_COLLECTION, "email", &req.email)
        .await
        .map_err(|err| AppError::upstream("Failed to log in", err))?;

    // 查无此邮箱与密码不符走同一个错误分支
    let Some(Document { id, data }) = matches.into_iter().next() else {
        return Err(AppError::InvalidCredentials);
    };
    let account: Account = serde_json::from_value(data)
        .map_err(|err| AppError::upstream("Failed to log in", err))?;

    let password_ok = verify_password(&req.password, &account.password_hash)
        .map_err(|err| AppError::upstream("Failed to log in", err))?;
    if !password_ok {
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_token(&id, &account.email, Some(&account.role), &state.config)
        .map_err(|err| AppError::upstream("Failed to log in", err))?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        role: account.role,
    }))
}

// 认证中间件验证通过后，声明经请求扩展传入
#[axum::debug_handler]
pub async fn protected(Extension(claims): Extension<Claims>) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "You have access".to_string(),
        user: claims,
    })
}
