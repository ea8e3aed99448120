use serde_json::Value;
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub const PRODUCTS_COLLECTION: &str = "products";
pub const ACCOUNTS_COLLECTION: &str = "accounts";

// 文档存储适配层：所有集合共用一张 jsonb 表，按集合名区分。
// 错误以 sqlx::Error 原样抛给 handler，由 handler 决定上下文消息
#[derive(Clone)]
pub struct DocumentStore {
    pool: PgPool,
}

// 查询结果：文档本体加上存储分配的ID
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl DocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 启动时建表，幂等
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // 写入新文档，返回生成的ID
    pub async fn add(&self, collection: &str, data: &Value) -> Result<String, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, sqlx::Error> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| row.get("data")))
    }

    pub async fn list(&self, collection: &str) -> Result<Vec<Document>, sqlx::Error> {
        let rows =
            sqlx::query("SELECT id, data FROM documents WHERE collection = $1 ORDER BY created_at")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows
            .into_iter()
            .map(|row| Document {
                id: row.get("id"),
                data: row.get("data"),
            })
            .collect())
    }

    // 顶层字段的精确匹配查询
    pub async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT id, data FROM documents WHERE collection = $1 AND data->>$2 = $3 ORDER BY created_at",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| Document {
                id: row.get("id"),
                data: row.get("data"),
            })
            .collect())
    }

    // 删除文档，返回是否确有行被删除
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
