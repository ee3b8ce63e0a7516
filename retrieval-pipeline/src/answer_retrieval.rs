use std::{fmt::Write, sync::Arc};

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client,
};
use async_trait::async_trait;
use common::{
    error::AppError, storage::types::knowledge_entry::KnowledgeEntry,
    utils::config::AppConfig,
};
use tracing::{error, info, instrument};

/// Reply returned whenever the completion service cannot produce one.
pub const FALLBACK_REPLY: &str = "I apologize, but I'm having trouble processing your request right now. Please try again later.";

#[async_trait]
pub trait ChatCompletionService: Send + Sync {
    async fn create_chat_completion(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, AppError>;
}

#[async_trait]
impl ChatCompletionService for Client<OpenAIConfig> {
    async fn create_chat_completion(
        &self,
        request: CreateChatCompletionRequest,
    ) -> Result<CreateChatCompletionResponse, AppError> {
        Ok(self.chat().create(request).await?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub persona_name: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for GenerationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.chat_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            persona_name: config.persona_name.clone(),
        }
    }
}

/// Turns a question plus retrieved facts into a conversational answer.
pub struct ResponseGenerator {
    backend: Arc<dyn ChatCompletionService>,
    settings: GenerationSettings,
}

impl ResponseGenerator {
    pub fn new(backend: Arc<dyn ChatCompletionService>, settings: GenerationSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Always yields displayable text; failures become [`FALLBACK_REPLY`].
    #[instrument(skip_all, fields(context_entries = context.len()))]
    pub async fn generate(&self, query: &str, context: &[KnowledgeEntry]) -> String {
        match self.try_generate(query, context).await {
            Ok(reply) => {
                info!(reply_chars = reply.chars().count(), "Generated reply");
                reply
            }
            Err(err) => {
                error!(error = %err, "Error generating response");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    async fn try_generate(
        &self,
        query: &str,
        context: &[KnowledgeEntry],
    ) -> Result<String, AppError> {
        let system_prompt = build_system_prompt(&self.settings.persona_name, context);
        let request = create_chat_request(system_prompt, query, &self.settings)?;
        let response = self.backend.create_chat_completion(request).await?;
        process_llm_response(response)
    }
}

pub fn build_system_prompt(persona_name: &str, context: &[KnowledgeEntry]) -> String {
    let mut context_block = String::new();
    if !context.is_empty() {
        let _ = writeln!(context_block, "Relevant information about {persona_name}:");
        for entry in context {
            let _ = writeln!(context_block, "{}", entry.as_context_line());
        }
    }

    format!(
        r"You are {persona_name}'s AI assistant for recruiters and potential collaborators.
Speak as {persona_name}: professional, concise, friendly. Use the provided context to give accurate, specific answers.

Key instructions:
- Answer based on the provided context when relevant
- If the context doesn't contain the answer, rely only on what is generally known from {persona_name}'s CV
- Be conversational but professional
- Offer to provide more details or links when helpful
- Answer in the user's language when possible
- If unsure about specific details, acknowledge it honestly

{context_block}
Always prioritize accuracy over completeness. If you don't have specific information, say so rather than making assumptions."
    )
}

pub fn create_chat_request(
    system_prompt: String,
    query: &str,
    settings: &GenerationSettings,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model(&settings.model)
        .messages([
            ChatCompletionRequestSystemMessage::from(system_prompt).into(),
            ChatCompletionRequestUserMessage::from(query.to_string()).into(),
        ])
        .max_completion_tokens(settings.max_tokens)
        .temperature(settings.temperature)
        .build()
}

pub fn process_llm_response(response: CreateChatCompletionResponse) -> Result<String, AppError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| AppError::LLMParsing("No content found in LLM response".into()))
}
