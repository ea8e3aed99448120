use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use shop_backend::{
    AppState,
    config::Config,
    media::MediaStore,
    middleware::{auth_middleware, log_errors},
    routes,
    store::DocumentStore,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 文档存储与媒体服务客户端
    let store = DocumentStore::new(pool);
    store
        .ensure_schema()
        .await
        .expect("Failed to prepare document store schema");
    let media = MediaStore::new(&config);

    let state = AppState {
        store,
        media,
        config,
    };

    // 公开路由
    let public_routes = Router::new()
        .route(
            "/post",
            // 上传接口放宽请求体上限，默认 2MiB 装不下图片
            post(routes::product::create_product).layer(DefaultBodyLimit::max(10 * 1024 * 1024)),
        )
        .route("/posts", get(routes::product::list_products))
        .route("/posts/{section}", get(routes::product::list_by_section))
        .route(
            "/post/{id}",
            get(routes::product::get_product).delete(routes::product::delete_product),
        )
        .route("/log-in", post(routes::account::login))
        .route("/sign-in", post(routes::account::register));

    // 受保护路由，先过认证中间件
    let protected_routes = Router::new()
        .route("/protected", get(routes::account::protected))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors))
        .layer(CorsLayer::permissive());

    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
