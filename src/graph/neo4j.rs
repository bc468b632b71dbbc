// Neo4j graph store over the transactional HTTP API
// API Reference: https://neo4j.com/docs/http-api/current/

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::GraphStoreConfig;
use crate::graph::GraphStore;
use crate::types::{AppError, AppResult};

const MERGE_CHUNK: &str = "MERGE (c:Chunk {id: $chunk_id}) SET c.text = $text";

const DELETE_CHUNKS: &str = "MATCH (c:Chunk) WHERE c.id STARTS WITH $prefix \
     DETACH DELETE c RETURN count(*) AS deleted";

const FIND_CHUNKS: &str = "MATCH (c:Chunk) \
     WHERE toLower(c.text) CONTAINS $keyword \
     RETURN c.text AS text LIMIT $limit";

const CHUNK_ID_CONSTRAINT: &str =
    "CREATE CONSTRAINT chunk_id IF NOT EXISTS FOR (c:Chunk) REQUIRE c.id IS UNIQUE";

pub struct Neo4jGraphStore {
    client: Client,
    endpoint: String,
    user: String,
    password: String,
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: Value,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Deserialize)]
struct StatementResult {
    #[serde(default)]
    data: Vec<Record>,
}

#[derive(Deserialize)]
struct Record {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl Neo4jGraphStore {
    pub fn new(config: &GraphStoreConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!(
                "{}/db/{}/tx/commit",
                config.uri.trim_end_matches('/'),
                config.database
            ),
            user: config.user.clone(),
            password: config.password.clone(),
        }
    }

    /// Ensure the uniqueness constraint that backs `MERGE` on chunk ids
    pub async fn ensure_schema(&self) -> AppResult<()> {
        self.run(CHUNK_ID_CONSTRAINT, json!({})).await?;
        Ok(())
    }

    async fn run(&self, statement: &str, parameters: Value) -> AppResult<Vec<StatementResult>> {
        let body = TxRequest {
            statements: vec![Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GraphStore(format!("Neo4j request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::GraphStore(format!(
                "Neo4j HTTP error ({}): {}",
                status, error_text
            )));
        }

        let tx: TxResponse = response
            .json()
            .await
            .map_err(|e| AppError::GraphStore(format!("Failed to parse Neo4j response: {}", e)))?;

        // Cypher failures come back as 200 with a populated errors array
        if let Some(error) = tx.errors.first() {
            return Err(AppError::GraphStore(format!("{}: {}", error.code, error.message)));
        }

        Ok(tx.results)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn merge_chunk(&self, id: &str, text: &str) -> AppResult<()> {
        self.run(MERGE_CHUNK, json!({ "chunk_id": id, "text": text })).await?;
        debug!(chunk_id = id, "Indexed chunk in graph");
        Ok(())
    }

    async fn delete_by_id_prefix(&self, id_prefix: &str) -> AppResult<u64> {
        let results = self.run(DELETE_CHUNKS, json!({ "prefix": id_prefix })).await?;
        let deleted = results
            .into_iter()
            .flat_map(|result| result.data)
            .filter_map(|record| record.row.into_iter().next())
            .find_map(|value| value.as_u64())
            .unwrap_or(0);
        debug!(id_prefix, deleted, "Deleted chunk nodes from graph");
        Ok(deleted)
    }

    async fn find_chunks_containing(&self, keyword: &str, limit: usize) -> AppResult<Vec<String>> {
        let results = self
            .run(FIND_CHUNKS, json!({ "keyword": keyword, "limit": limit }))
            .await?;

        Ok(results
            .into_iter()
            .flat_map(|result| result.data)
            .filter_map(|record| record.row.into_iter().next())
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect())
    }

    async fn health_check(&self) -> AppResult<()> {
        self.run("RETURN 1", json!({})).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "neo4j"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphBackend;
    use mockito::Matcher;

    fn config(uri: String) -> GraphStoreConfig {
        GraphStoreConfig {
            backend: GraphBackend::Neo4j,
            uri,
            user: "neo4j".to_string(),
            password: "veritas_password".to_string(),
            database: "neo4j".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_chunks_parses_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/db/neo4j/tx/commit")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .match_body(Matcher::PartialJson(json!({
                "statements": [{ "parameters": { "keyword": "attention", "limit": 2 } }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"results":[{"columns":["text"],"data":[{"row":["Attention is all you need"],"meta":[null]},{"row":["Multi-head attention"],"meta":[null]}]}],"errors":[]}"#,
            )
            .create_async()
            .await;

        let store = Neo4jGraphStore::new(&config(server.url()));
        let texts = store.find_chunks_containing("attention", 2).await.unwrap();

        mock.assert_async().await;
        assert_eq!(texts, vec!["Attention is all you need", "Multi-head attention"]);
    }

    #[tokio::test]
    async fn test_merge_chunk_sends_cypher_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/db/neo4j/tx/commit")
            .match_body(Matcher::PartialJson(json!({
                "statements": [{
                    "statement": MERGE_CHUNK,
                    "parameters": { "chunk_id": "manual/chunk_0", "text": "hello" }
                }]
            })))
            .with_status(200)
            .with_body(r#"{"results":[{"columns":[],"data":[]}],"errors":[]}"#)
            .create_async()
            .await;

        let store = Neo4jGraphStore::new(&config(format!("{}/", server.url())));
        store.merge_chunk("manual/chunk_0", "hello").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_cypher_errors_are_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/neo4j/tx/commit")
            .with_status(200)
            .with_body(
                r#"{"results":[],"errors":[{"code":"Neo.ClientError.Security.Unauthorized","message":"The client is unauthorized"}]}"#,
            )
            .create_async()
            .await;

        let store = Neo4jGraphStore::new(&config(server.url()));
        let err = store.health_check().await.unwrap_err();
        match err {
            AppError::GraphStore(message) => assert!(message.contains("Unauthorized")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_by_id_prefix_returns_count() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/db/neo4j/tx/commit")
            .match_body(Matcher::PartialJson(json!({
                "statements": [{
                    "statement": DELETE_CHUNKS,
                    "parameters": { "prefix": "manual/" }
                }]
            })))
            .with_status(200)
            .with_body(r#"{"results":[{"columns":["deleted"],"data":[{"row":[4],"meta":[null]}]}],"errors":[]}"#)
            .create_async()
            .await;

        let store = Neo4jGraphStore::new(&config(server.url()));
        assert_eq!(store.delete_by_id_prefix("manual/").await.unwrap(), 4);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_errors_are_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/neo4j/tx/commit")
            .with_status(503)
            .with_body("database unavailable")
            .create_async()
            .await;

        let store = Neo4jGraphStore::new(&config(server.url()));
        let err = store.merge_chunk("manual/chunk_0", "text").await.unwrap_err();
        match err {
            AppError::GraphStore(message) => {
                assert!(message.contains("503"), "{message}");
                assert!(message.contains("database unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
