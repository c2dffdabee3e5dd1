use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_openai::Client;
use async_trait::async_trait;
use textvault_core::{Embedding, EmbeddingError};

use crate::EmbeddingProviderError;

/// Connection settings for the OpenAI embeddings endpoint.
///
/// Credentials travel through this struct explicitly; the provider never reads
/// the process environment on its own. Build one in `main`, hand it to
/// [`OpenAiEmbedding::new`], and it is gone by the time any request is made.
#[derive(Clone, Debug)]
pub struct OpenAiEmbeddingConfig {
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
    pub dimension: usize,
}

impl OpenAiEmbeddingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: None,
            model: "text-embedding-ada-002".to_string(),
            dimension: 1536,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Model and its published vector width; responses of any other width are
    /// rejected as invalid.
    pub fn with_model(mut self, model: impl Into<String>, dimension: usize) -> Self {
        self.model = model.into();
        self.dimension = dimension;
        self
    }
}

#[derive(Clone)]
pub struct OpenAiEmbedding {
    client: Client<OpenAIConfig>,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedding {
    pub fn new(config: OpenAiEmbeddingConfig) -> Self {
        let mut openai = OpenAIConfig::new().with_api_key(config.api_key);
        if let Some(api_base) = config.api_base {
            openai = openai.with_api_base(api_base);
        }
        Self {
            client: Client::with_config(openai),
            model: config.model,
            dimension: config.dimension,
        }
    }

    /// Inject a preconfigured client (tests point this at a mock server).
    pub fn with_client(
        client: Client<OpenAIConfig>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            dimension,
        }
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), EmbeddingError> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected embedding dimension {}, got {}",
                self.dimension,
                embedding.len()
            ))
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Embedding for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(text)
            .build()
            .map_err(|err| EmbeddingError::Other(Box::new(err)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|err| EmbeddingProviderError::Request(err.to_string()))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| {
                EmbeddingProviderError::InvalidResponse("missing embedding".to_string())
            })?;

        self.check_dimension(&embedding)?;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(texts.to_vec())
            .build()
            .map_err(|err| EmbeddingError::Other(Box::new(err)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|err| EmbeddingProviderError::Request(err.to_string()))?;

        if response.data.len() != texts.len() {
            return Err(EmbeddingProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            ))
            .into());
        }

        let mut embeddings = Vec::with_capacity(response.data.len());
        for item in response.data {
            self.check_dimension(&item.embedding)?;
            embeddings.push(item.embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
