use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::models::{PostRow, PostStatus};

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn init(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (\
                id INTEGER PRIMARY KEY AUTOINCREMENT,\
                prompt TEXT NOT NULL,\
                caption TEXT,\
                image_url TEXT,\
                storage_key TEXT,\
                reference_image_url TEXT,\
                reference_storage_key TEXT,\
                model_used TEXT,\
                status TEXT NOT NULL DEFAULT 'pending',\
                error_message TEXT,\
                created_at TEXT NOT NULL,\
                updated_at TEXT NOT NULL\
            );",
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status);")
            .execute(&pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);")
            .execute(&pool)
            .await?;

        info!("Database tables created successfully");

        Ok(Database { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn create_post(
        &self,
        prompt: &str,
        model_used: &str,
        reference_image_url: Option<&str>,
        reference_storage_key: Option<&str>,
    ) -> Result<i64> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO posts (prompt, model_used, status, reference_image_url, reference_storage_key, created_at, updated_at) \
             VALUES (?, ?, 'generating', ?, ?, ?, ?)",
        )
        .bind(prompt)
        .bind(model_used)
        .bind(reference_image_url)
        .bind(reference_storage_key)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn mark_generating(
        &self,
        post_id: i64,
        prompt: &str,
        reference_image_url: Option<&str>,
        reference_storage_key: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE posts \
             SET status = 'generating', prompt = ?, \
                 reference_image_url = COALESCE(?, reference_image_url), \
                 reference_storage_key = COALESCE(?, reference_storage_key), \
                 updated_at = ? \
             WHERE id = ?",
        )
        .bind(prompt)
        .bind(reference_image_url)
        .bind(reference_storage_key)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn complete_post(
        &self,
        post_id: i64,
        image_url: &str,
        storage_key: &str,
        model_used: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE posts \
             SET status = 'completed', image_url = ?, storage_key = ?, model_used = ?, \
                 error_message = NULL, updated_at = ? \
             WHERE id = ?",
        )
        .bind(image_url)
        .bind(storage_key)
        .bind(model_used)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fail_post(&self, post_id: i64, error_message: &str) -> Result<()> {
        sqlx::query(
            "UPDATE posts SET status = 'failed', error_message = ?, updated_at = ? WHERE id = ?",
        )
        .bind(error_message)
        .bind(Utc::now())
        .bind(post_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_caption(&self, post_id: i64, caption: &str) -> Result<()> {
        sqlx::query("UPDATE posts SET caption = ?, updated_at = ? WHERE id = ?")
            .bind(caption)
            .bind(Utc::now())
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn list_posts(
        &self,
        status: Option<PostStatus>,
        limit: i64,
    ) -> Result<Vec<PostRow>> {
        let mut query = String::from(
            "SELECT id, prompt, caption, image_url, storage_key, reference_image_url, \
             reference_storage_key, model_used, status, error_message, created_at, updated_at \
             FROM posts",
        );
        if status.is_some() {
            query.push_str(" WHERE status = ?");
        }
        query.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut statement = sqlx::query_as::<_, PostRow>(&query);
        if let Some(status) = status {
            statement = statement.bind(status.as_str());
        }
        let rows = statement.bind(limit).fetch_all(&self.pool).await?;

        Ok(rows)
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<PostRow>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, prompt, caption, image_url, storage_key, reference_image_url, \
             reference_storage_key, model_used, status, error_message, created_at, updated_at \
             FROM posts WHERE id = ?",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
