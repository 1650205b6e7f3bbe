use crate::domain::bug_report::{BugReportDraft, FieldKey};
use crate::domain::classification::ClassificationResult;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Editing { step: usize },
    /// Classification request in flight; the wizard accepts no edits.
    Submitting { step: usize },
    Summary {
        draft: BugReportDraft,
        classification: ClassificationResult,
    },
}

impl WizardState {
    pub fn name(&self) -> &'static str {
        match self {
            WizardState::Editing { .. } => "editing",
            WizardState::Submitting { .. } => "submitting",
            WizardState::Summary { .. } => "summary",
        }
    }
}

/// What the presentation layer needs to render the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepView {
    pub field: FieldKey,
    pub label: &'static str,
    pub value: String,
    pub invalid: bool,
    pub step: usize,
    pub total_steps: usize,
    pub can_retreat: bool,
    pub can_advance: bool,
    pub is_last_step: bool,
    pub pending: bool,
    pub missing_fields: Vec<FieldKey>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub draft: BugReportDraft,
    pub classification: ClassificationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WizardView {
    Editing(StepView),
    Summary(SummaryView),
}
