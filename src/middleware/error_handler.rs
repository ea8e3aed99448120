use axum::{
    body::{Body, to_bytes},
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

// 响应日志中间件：回读 5xx 响应体并记录到控制台，客户端错误只记 debug
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    if response.status().is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, 64 * 1024).await {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("Failed to read error response body: {}", err);
                return Response::from_parts(parts, Body::empty());
            }
        };

        error!(
            "{} {} failed - Status: {}, Body: {}",
            method,
            path,
            parts.status,
            String::from_utf8_lossy(&bytes)
        );

        // body 已被消费，重建响应前去掉失效的长度头
        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    } else {
        if response.status().is_client_error() {
            debug!("{} {} rejected - Status: {}", method, path, response.status());
        }
        response
    }
}
