use serde::{Deserialize, Serialize};

use crate::utils::Claims;

fn default_role() -> String {
    "user".to_string()
}

// 账号文档：只进出存储，从不直接作为响应返回，
// 因此密码散列照常序列化落库
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    // 角色是自由字符串，缺省为 user，其余角色由运营侧写入
    #[serde(default = "default_role")]
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: Claims,
}
