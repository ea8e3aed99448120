use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;

// 令牌固定一小时有效，过期是唯一的失效途径（无刷新、无吊销）
const TOKEN_TTL_SECS: i64 = 3600;
const BCRYPT_COST: u32 = 10;

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), BCRYPT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // 账号ID
    pub email: String, // 邮箱
    // 登录签发的令牌才携带角色，注册令牌没有
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64, // 过期时间
    pub iat: i64, // 签发时间
}

pub fn generate_token(
    account_id: &str,
    email: &str,
    role: Option<&str>,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::seconds(TOKEN_TTL_SECS))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: account_id.to_string(),
        email: email.to_string(),
        role: role.map(str::to_string),
        exp: expiration,
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}
