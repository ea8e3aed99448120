use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

// 登录失败对外只有这一条消息，避免探测出哪个字段错了
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

// 统一错误类型：handler 在本地捕获失败并映射为 HTTP 状态加 JSON 响应体，
// 不向进程层抛出任何未处理错误
#[derive(Debug)]
pub enum AppError {
    // 请求字段校验失败
    Validation(String),
    // 注册时两次输入的密码不一致
    PasswordMismatch,
    // 邮箱或用户名已被占用
    Conflict(String),
    // 登录凭证错误
    InvalidCredentials,
    // 资源不存在
    NotFound(String),
    // 上游文档存储或媒体服务失败
    Upstream { context: String, details: String },
    // 缺少令牌
    Unauthorized,
    // 令牌无效或已过期
    Forbidden,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn upstream(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        AppError::Upstream {
            context: context.into(),
            details: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Passwords do not match" })),
            )
                .into_response(),
            AppError::Conflict(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            AppError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": INVALID_CREDENTIALS_MESSAGE })),
            )
                .into_response(),
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            AppError::Upstream { context, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": context, "details": details })),
            )
                .into_response(),
            // 授权失败不带响应体
            AppError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            AppError::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}
