use serde::{Deserialize, Serialize};

/// Severity guess extracted from the completion service's reply.
///
/// Each field is independently optional; `None` means the reply did not
/// contain a recognisable line for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub severity: Option<String>,
    pub confidence: Option<String>,
}

impl ClassificationResult {
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.confidence.is_none()
    }
}
