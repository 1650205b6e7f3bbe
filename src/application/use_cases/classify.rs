use crate::domain::classification::ClassificationResult;
use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::llm_clients::LLMClient;
use crate::infrastructure::response::{clean_llm_response, interpret};
use std::sync::Arc;
use tracing::{debug, info};

pub fn build_prompt(description: &str) -> String {
    format!(
        "Analyze the following bug report description and provide the predicted severity (e.g., Low, Medium, High, Critical) and a confidence level (as a percentage) for your severity prediction. Respond in a structured format like:\n\nSeverity: [Predicted Severity]\nConfidence: [Confidence Level]%\n\nBug Report Description: \"{}\"",
        description
    )
}

/// Asks the completion service for a severity guess on a bug description.
pub struct ClassifyUseCase {
    llm_client: Arc<dyn LLMClient + Send + Sync>,
}

impl ClassifyUseCase {
    pub fn new(llm_client: Arc<dyn LLMClient + Send + Sync>) -> Self {
        Self { llm_client }
    }

    pub async fn execute(
        &self,
        config: &LLMConfig,
        description: &str,
    ) -> Result<ClassificationResult> {
        let prompt = build_prompt(description);

        let raw_result = self.llm_client.generate(config, "", &prompt).await?;
        let cleaned = clean_llm_response(&raw_result);
        let classification = interpret(&cleaned);

        if classification.is_empty() {
            debug!(response = %cleaned, "No severity or confidence found in response");
        }
        info!(
            severity = classification.severity.as_deref().unwrap_or("-"),
            confidence = classification.confidence.as_deref().unwrap_or("-"),
            "Classified bug report"
        );

        Ok(classification)
    }
}
