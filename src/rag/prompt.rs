// Hybrid context assembly

pub const CONTEXT_SEPARATOR: &str = "\n---\n";

/// Retrieved material for one question, before it is turned into a prompt
#[derive(Debug, Clone, Default)]
pub struct HybridContext {
    pub vector_chunks: Vec<String>,
    pub graph_chunks: Vec<String>,
    pub keyword: String,
}

impl HybridContext {
    pub fn vector_context(&self) -> String {
        join_context(&self.vector_chunks)
    }

    pub fn graph_context(&self) -> String {
        join_context(&self.graph_chunks)
    }

    pub fn build_prompt(&self, question: &str) -> String {
        build_prompt(&self.vector_context(), &self.graph_context(), question)
    }
}

pub fn join_context<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.as_ref())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

pub fn build_prompt(vector_context: &str, graph_context: &str, question: &str) -> String {
    format!(
        r#"You are a Research Assistant analyzing a technical document.

[CONTEXT FROM DATABASE]:
{vector_context}

[ADDITIONAL CONTEXT]:
{graph_context}

USER QUESTION: {question}

INSTRUCTIONS:
1. Answer the question based ONLY on the provided context.
2. If the context contains multiple topics, summarize the main one.

YOUR ANSWER:
"#
    )
}
