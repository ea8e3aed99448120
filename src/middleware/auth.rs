use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};

use crate::{config::Config, error::AppError, utils::verify_token};

// 认证中间件：没有令牌回 401，令牌无效或过期回 403，
// 验证通过后把解码出的声明塞进请求扩展供下游 handler 读取
pub async fn auth_middleware(
    State(config): State<Config>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let claims = verify_token(token, &config).map_err(|_| AppError::Forbidden)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Json, Router,
        body::Body,
        http::{Request, StatusCode, header},
        middleware::from_fn_with_state,
        routing::get,
    };
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use tower::ServiceExt;

    use crate::utils::{Claims, generate_token};

    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "gate-secret".to_string(),
            media_cloud_name: "demo".to_string(),
            media_api_key: "key".to_string(),
            media_api_secret: "secret".to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 4000,
        }
    }

    async fn whoami(Extension(claims): Extension<Claims>) -> Json<Claims> {
        Json(claims)
    }

    fn gated_router(config: Config) -> Router {
        Router::new()
            .route("/protected", get(whoami))
            .layer(from_fn_with_state(config, auth_middleware))
    }

    fn request_with_auth(value: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/protected");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let router = gated_router(test_config());
        let response = router.oneshot(request_with_auth(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_forbidden() {
        let router = gated_router(test_config());
        let response = router
            .oneshot(request_with_auth(Some("Bearer not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn expired_token_is_forbidden() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "acc-1".to_string(),
            email: "a@b.com".to_string(),
            role: Some("user".to_string()),
            iat: now - 3720,
            exp: now - 120,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let router = gated_router(config);
        let response = router
            .oneshot(request_with_auth(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn valid_token_reaches_handler_with_claims() {
        let config = test_config();
        let token = generate_token("acc-9", "z@y.com", Some("user"), &config).unwrap();

        let router = gated_router(config);
        let response = router
            .oneshot(request_with_auth(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let claims: Claims = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(claims.sub, "acc-9");
        assert_eq!(claims.email, "z@y.com");
    }
}
