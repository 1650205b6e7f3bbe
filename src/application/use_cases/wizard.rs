//! Step-by-step bug report wizard.
//!
//! All mutations of the draft and the step index go through
//! [`WizardController`]. Submission is split into [`WizardController::begin_submit`]
//! and [`WizardController::complete_submit`] so callers sharing a controller can
//! release their lock while the classification request is in flight.

use crate::application::use_cases::classify::ClassifyUseCase;
use crate::domain::bug_report::{BugReportDraft, FieldKey, ValidationResult, LAST_STEP, STEPS};
use crate::domain::classification::ClassificationResult;
use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::LLMConfig;
use crate::domain::wizard::{StepView, SummaryView, WizardState, WizardView};
use tracing::{error, info, warn};

/// What the classifier needs from the draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRequest {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Required fields are empty; the wizard went back to the first step.
    Invalid(ValidationResult),
    /// Validation passed and the wizard is now `Submitting`.
    Pending(ClassificationRequest),
}

#[derive(Debug, Clone)]
pub struct WizardController {
    draft: BugReportDraft,
    state: WizardState,
    missing: ValidationResult,
    error: Option<String>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    pub fn new() -> Self {
        Self {
            draft: BugReportDraft::default(),
            state: WizardState::Editing { step: 0 },
            missing: ValidationResult::default(),
            error: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn draft(&self) -> &BugReportDraft {
        &self.draft
    }

    pub fn missing(&self) -> &ValidationResult {
        &self.missing
    }

    /// Last classification failure, kept until dismissed or the next submit.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, WizardState::Submitting { .. })
    }

    pub fn advance(&mut self) {
        if let WizardState::Editing { step } = &mut self.state {
            if *step < LAST_STEP {
                *step += 1;
            }
        }
    }

    pub fn retreat(&mut self) {
        if let WizardState::Editing { step } = &mut self.state {
            if *step > 0 {
                *step -= 1;
            }
        }
    }

    /// Stores the value verbatim. Validation markers are only recomputed on submit.
    pub fn set_field(&mut self, key: FieldKey, value: String) -> Result<()> {
        match self.state {
            WizardState::Editing { .. } => {
                self.draft.set(key, value);
                Ok(())
            }
            _ => Err(AppError::InvalidState(format!(
                "cannot edit {} while {}",
                key,
                self.state.name()
            ))),
        }
    }

    pub fn begin_submit(&mut self) -> Result<SubmitOutcome> {
        let step = match self.state {
            WizardState::Editing { step } => step,
            _ => {
                return Err(AppError::InvalidState(format!(
                    "cannot submit while {}",
                    self.state.name()
                )))
            }
        };

        let missing = self.draft.missing_required();
        if !missing.is_empty() {
            warn!(missing = ?missing.fields(), "Bug report is missing required fields");
            self.missing = missing.clone();
            self.state = WizardState::Editing { step: 0 };
            return Ok(SubmitOutcome::Invalid(missing));
        }

        self.missing = ValidationResult::default();
        self.error = None;
        self.state = WizardState::Submitting { step };

        Ok(SubmitOutcome::Pending(ClassificationRequest {
            description: self.draft.description.clone(),
        }))
    }

    pub fn complete_submit(&mut self, result: Result<ClassificationResult>) -> Result<()> {
        let step = match self.state {
            WizardState::Submitting { step } => step,
            _ => {
                return Err(AppError::InvalidState(format!(
                    "no submission in flight while {}",
                    self.state.name()
                )))
            }
        };

        match result {
            Ok(classification) => {
                info!("Bug report classified; showing summary");
                self.state = WizardState::Summary {
                    draft: self.draft.clone(),
                    classification,
                };
            }
            Err(err) => {
                error!(error = %err, "Failed to classify bug report");
                self.error = Some(format!(
                    "Failed to analyze bug using AI, please try again. ({})",
                    err
                ));
                self.state = WizardState::Editing { step };
            }
        }

        Ok(())
    }

    /// Validates, classifies and moves to the summary in one go.
    ///
    /// A classification failure is not returned as `Err`: it leaves the wizard
    /// editing with [`WizardController::error`] set.
    pub async fn submit(
        &mut self,
        classifier: &ClassifyUseCase,
        config: &LLMConfig,
    ) -> Result<&WizardState> {
        if let SubmitOutcome::Pending(request) = self.begin_submit()? {
            let result = classifier.execute(config, &request.description).await;
            self.complete_submit(result)?;
        }

        Ok(&self.state)
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Discards everything and starts over at the first step.
    pub fn reset(&mut self) -> Result<()> {
        if self.is_pending() {
            return Err(AppError::InvalidState(
                "cannot reset while submitting".to_string(),
            ));
        }

        *self = Self::new();
        Ok(())
    }

    pub fn view(&self) -> WizardView {
        let (step, pending) = match &self.state {
            WizardState::Editing { step } => (*step, false),
            WizardState::Submitting { step } => (*step, true),
            WizardState::Summary {
                draft,
                classification,
            } => {
                return WizardView::Summary(SummaryView {
                    draft: draft.clone(),
                    classification: classification.clone(),
                })
            }
        };

        let definition = STEPS[step];
        WizardView::Editing(StepView {
            field: definition.field,
            label: definition.label,
            value: self.draft.get(definition.field).to_string(),
            invalid: self.missing.contains(definition.field),
            step,
            total_steps: STEPS.len(),
            can_retreat: !pending && step > 0,
            can_advance: !pending && step < LAST_STEP,
            is_last_step: step == LAST_STEP,
            pending,
            missing_fields: self.missing.fields().to_vec(),
            error: self.error.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm_clients::testing::ScriptedClient;
    use std::sync::Arc;

    fn step_of(wizard: &WizardController) -> usize {
        match wizard.state() {
            WizardState::Editing { step } | WizardState::Submitting { step } => *step,
            WizardState::Summary { .. } => panic!("wizard is in summary"),
        }
    }

    fn at_step(step: usize) -> WizardController {
        let mut wizard = WizardController::new();
        for _ in 0..step {
            wizard.advance();
        }
        wizard
    }

    fn fill_required(wizard: &mut WizardController) {
        wizard
            .set_field(FieldKey::Title, "Crash on save".to_string())
            .unwrap();
        wizard
            .set_field(
                FieldKey::Description,
                "App crashes when saving a large file".to_string(),
            )
            .unwrap();
        wizard
            .set_field(
                FieldKey::StepsToReproduce,
                "Open file, edit, save".to_string(),
            )
            .unwrap();
        wizard
            .set_field(FieldKey::Environment, "Windows 11, Chrome 120".to_string())
            .unwrap();
    }

    fn classifier(client: &Arc<ScriptedClient>) -> ClassifyUseCase {
        ClassifyUseCase::new(client.clone())
    }

    #[test]
    fn test_advance_and_retreat_are_bounded() {
        for i in 0..STEPS.len() {
            let mut wizard = at_step(i);
            assert_eq!(step_of(&wizard), i);
            wizard.advance();
            assert_eq!(step_of(&wizard), (i + 1).min(LAST_STEP));

            let mut wizard = at_step(i);
            wizard.retreat();
            assert_eq!(step_of(&wizard), i.saturating_sub(1));
        }
    }

    #[test]
    fn test_repeated_navigation_at_edges() {
        let mut wizard = WizardController::new();
        for _ in 0..3 {
            wizard.retreat();
        }
        assert_eq!(step_of(&wizard), 0);

        for _ in 0..(STEPS.len() + 5) {
            wizard.advance();
        }
        assert_eq!(step_of(&wizard), LAST_STEP);
    }

    #[test]
    fn test_set_field_is_verbatim() {
        let mut wizard = WizardController::new();
        wizard
            .set_field(FieldKey::Label, "  Bug ".to_string())
            .unwrap();
        assert_eq!(wizard.draft().label, "  Bug ");
    }

    #[test]
    fn test_invalid_submit_resets_to_first_step() {
        let mut wizard = at_step(LAST_STEP);
        wizard
            .set_field(FieldKey::Title, "Crash on save".to_string())
            .unwrap();
        wizard
            .set_field(FieldKey::Label, "Bug".to_string())
            .unwrap();

        let outcome = wizard.begin_submit().unwrap();
        let expected = vec![
            FieldKey::Description,
            FieldKey::StepsToReproduce,
            FieldKey::Environment,
        ];
        match outcome {
            SubmitOutcome::Invalid(missing) => assert_eq!(missing.fields(), expected.as_slice()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(step_of(&wizard), 0);
        assert_eq!(wizard.missing().fields(), expected.as_slice());
    }

    #[test]
    fn test_validation_markers_persist_until_next_submit() {
        let mut wizard = WizardController::new();
        wizard.begin_submit().unwrap();
        assert!(wizard.missing().contains(FieldKey::Title));

        wizard
            .set_field(FieldKey::Title, "Crash on save".to_string())
            .unwrap();
        assert!(wizard.missing().contains(FieldKey::Title));

        wizard.begin_submit().unwrap();
        assert!(!wizard.missing().contains(FieldKey::Title));
    }

    #[test]
    fn test_view_flags_invalid_current_field() {
        let mut wizard = WizardController::new();
        wizard.begin_submit().unwrap();

        match wizard.view() {
            WizardView::Editing(view) => {
                assert_eq!(view.field, FieldKey::Title);
                assert_eq!(view.label, "Bug Title");
                assert!(view.invalid);
                assert!(!view.can_retreat);
                assert!(view.can_advance);
                assert!(!view.is_last_step);
                assert_eq!(view.total_steps, 9);
            }
            other => panic!("unexpected view: {:?}", other),
        }

        wizard.advance();
        wizard.advance();
        match wizard.view() {
            WizardView::Editing(view) => {
                assert_eq!(view.field, FieldKey::Label);
                assert!(!view.invalid);
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_submit_is_rejected_while_pending() {
        let mut wizard = at_step(LAST_STEP);
        fill_required(&mut wizard);

        let outcome = wizard.begin_submit().unwrap();
        assert_eq!(
            outcome,
            SubmitOutcome::Pending(ClassificationRequest {
                description: "App crashes when saving a large file".to_string(),
            })
        );
        assert!(wizard.is_pending());
        assert!(matches!(
            wizard.begin_submit(),
            Err(AppError::InvalidState(_))
        ));
        assert!(wizard
            .set_field(FieldKey::Title, "changed".to_string())
            .is_err());
        assert!(wizard.reset().is_err());

        wizard.advance();
        assert_eq!(step_of(&wizard), LAST_STEP);
        assert!(matches!(wizard.view(), WizardView::Editing(view) if view.pending));
    }

    #[test]
    fn test_complete_without_submit_is_rejected() {
        let mut wizard = WizardController::new();
        let result = wizard.complete_submit(Ok(ClassificationResult::default()));
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_submit_end_to_end() {
        let client = Arc::new(ScriptedClient::replying("Severity: Critical\nConfidence: 95%"));
        let mut wizard = at_step(LAST_STEP);
        fill_required(&mut wizard);

        let state = wizard
            .submit(&classifier(&client), &LLMConfig::default())
            .await
            .unwrap()
            .clone();

        match state {
            WizardState::Summary {
                draft,
                classification,
            } => {
                assert_eq!(classification.severity.as_deref(), Some("Critical"));
                assert_eq!(classification.confidence.as_deref(), Some("95"));
                assert_eq!(draft.title, "Crash on save");
                assert_eq!(draft.description, "App crashes when saving a large file");
                assert_eq!(draft.steps_to_reproduce, "Open file, edit, save");
                assert_eq!(draft.environment, "Windows 11, Chrome 120");
                assert_eq!(draft.label, "");
            }
            other => panic!("unexpected state: {:?}", other),
        }
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_makes_no_call() {
        let client = Arc::new(ScriptedClient::replying("Severity: Low"));
        let mut wizard = at_step(LAST_STEP);
        wizard
            .set_field(FieldKey::Description, "desc".to_string())
            .unwrap();

        let state = wizard
            .submit(&classifier(&client), &LLMConfig::default())
            .await
            .unwrap()
            .clone();

        assert_eq!(state, WizardState::Editing { step: 0 });
        assert_eq!(client.calls(), 0);
        assert_eq!(
            wizard.missing().fields(),
            &[
                FieldKey::Title,
                FieldKey::StepsToReproduce,
                FieldKey::Environment
            ]
        );
    }

    #[tokio::test]
    async fn test_submit_service_failure_keeps_state() {
        let client = Arc::new(ScriptedClient::failing("Request failed: connection refused"));
        let mut wizard = at_step(LAST_STEP);
        fill_required(&mut wizard);
        let draft_before = wizard.draft().clone();

        let state = wizard
            .submit(&classifier(&client), &LLMConfig::default())
            .await
            .unwrap()
            .clone();

        assert_eq!(state, WizardState::Editing { step: LAST_STEP });
        assert_eq!(wizard.draft(), &draft_before);
        assert!(wizard
            .error()
            .is_some_and(|message| message.contains("connection refused")));
        assert!(wizard.missing().is_empty());

        wizard.dismiss_error();
        assert_eq!(wizard.error(), None);
    }

    #[tokio::test]
    async fn test_retry_after_failure_clears_error() {
        let failing = Arc::new(ScriptedClient::failing("boom"));
        let working = Arc::new(ScriptedClient::replying("Severity: Low"));
        let mut wizard = at_step(LAST_STEP);
        fill_required(&mut wizard);

        wizard
            .submit(&classifier(&failing), &LLMConfig::default())
            .await
            .unwrap();
        assert!(wizard.error().is_some());

        let state = wizard
            .submit(&classifier(&working), &LLMConfig::default())
            .await
            .unwrap()
            .clone();
        assert!(matches!(state, WizardState::Summary { .. }));
        assert_eq!(wizard.error(), None);
    }

    #[tokio::test]
    async fn test_summary_is_read_only_until_reset() {
        let client = Arc::new(ScriptedClient::replying("Severity: High"));
        let mut wizard = WizardController::new();
        fill_required(&mut wizard);
        wizard
            .submit(&classifier(&client), &LLMConfig::default())
            .await
            .unwrap();

        match wizard.view() {
            WizardView::Summary(summary) => {
                assert_eq!(summary.classification.severity.as_deref(), Some("High"));
                assert_eq!(summary.classification.confidence, None);
            }
            other => panic!("unexpected view: {:?}", other),
        }
        assert!(wizard
            .set_field(FieldKey::Title, "edited".to_string())
            .is_err());
        wizard.advance();
        assert!(matches!(wizard.state(), WizardState::Summary { .. }));

        wizard.reset().unwrap();
        assert_eq!(wizard.state(), &WizardState::Editing { step: 0 });
        assert_eq!(wizard.draft(), &BugReportDraft::default());
    }
}
