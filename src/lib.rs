use axum::extract::FromRef;

use config::Config;
use media::MediaStore;
use store::DocumentStore;

pub mod config;
pub mod error;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod store;
pub mod utils;

// 进程级共享状态：启动时构建一次，此后只读
#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: DocumentStore,
    pub media: MediaStore,
    pub config: Config,
}
