// pgvector-backed vector store
// Embeddings are bound as text literals and cast with ::vector, so no extra
// pgvector client crate is needed.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;

use crate::embeddings::{DocumentMetadata, EmbeddedChunk, SearchResult, VectorStore};
use crate::types::{AppError, AppResult};

pub struct PgVectorStore {
    pool: PgPool,
}

/// Render an embedding in pgvector's text input format: `[0.1,0.2,...]`
pub fn to_vector_literal(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", values.join(","))
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn upsert(&self, collection: &str, chunks: &[EmbeddedChunk]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for chunk in chunks {
            if chunk.embedding.iter().any(|v| !v.is_finite()) {
                return Err(AppError::VectorStore(format!(
                    "Chunk {} has a non-finite embedding value",
                    chunk.id
                )));
            }

            let metadata = serde_json::to_value(&chunk.metadata)
                .map_err(|e| AppError::VectorStore(format!("Failed to encode metadata: {}", e)))?;

            sqlx::query(
                r#"
                INSERT INTO chunks (collection, id, content, metadata, embedding)
                VALUES ($1, $2, $3, $4, $5::vector)
                ON CONFLICT (collection, id)
                DO UPDATE SET content = EXCLUDED.content,
                              metadata = EXCLUDED.metadata,
                              embedding = EXCLUDED.embedding
                "#,
            )
            .bind(collection)
            .bind(&chunk.id)
            .bind(&chunk.text)
            .bind(metadata)
            .bind(to_vector_literal(&chunk.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(collection, count = chunks.len(), "Upserted chunks into pgvector");
        Ok(())
    }

    async fn delete_by_id_prefix(&self, collection: &str, id_prefix: &str) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM chunks WHERE collection = $1 AND starts_with(id, $2)")
            .bind(collection)
            .bind(id_prefix)
            .execute(&self.pool)
            .await?;
        debug!(collection, id_prefix, deleted = result.rows_affected(), "Deleted chunks from pgvector");
        Ok(result.rows_affected())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> AppResult<Vec<SearchResult>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata, 1 - (embedding <=> $1::vector) AS score
            FROM chunks
            WHERE collection = $2
            ORDER BY embedding <=> $1::vector
            LIMIT $3
            "#,
        )
        .bind(to_vector_literal(embedding))
        .bind(collection)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> AppResult<SearchResult> {
                let metadata: serde_json::Value = row.try_get("metadata")?;
                Ok(SearchResult {
                    id: row.try_get("id")?,
                    text: row.try_get("content")?,
                    metadata: serde_json::from_value::<DocumentMetadata>(metadata).ok(),
                    score: row.try_get("score")?,
                })
            })
            .collect()
    }

    async fn health_check(&self) -> AppResult<()> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
