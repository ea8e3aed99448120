use std::env;

// 运行期配置：启动时从环境变量读取一次，此后只读
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub media_cloud_name: String,
    pub media_api_key: String,
    pub media_api_secret: String,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            media_cloud_name: env::var("MEDIA_CLOUD_NAME")?,
            media_api_key: env::var("MEDIA_API_KEY")?,
            media_api_secret: env::var("MEDIA_API_SECRET")?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|port| port.parse().ok())
                .unwrap_or(4000),
        })
    }
}
