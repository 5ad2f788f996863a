use anyhow::Result;
use async_trait::async_trait;

/// Decoding parameters for a single completion request.
#[derive(Debug, Clone, Copy)]
pub struct Decoding {
    pub temperature: f32,
    pub top_p: f32,
    pub max_completion_tokens: u32,
}

impl Default for Decoding {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            max_completion_tokens: 2048,
        }
    }
}

// =============================================================================
// StructuredAgent Trait
// =============================================================================

/// A chat model constrained to a JSON schema. Returns the raw JSON content of
/// the single choice; callers parse and validate.
#[async_trait]
pub trait StructuredAgent: Send + Sync {
    async fn structured(
        &self,
        schema_name: &str,
        schema: serde_json::Value,
        system: &str,
        user: &str,
        decoding: Decoding,
    ) -> Result<String>;
}

// =============================================================================
// EmbedAgent Trait
// =============================================================================

#[async_trait]
pub trait EmbedAgent: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}
