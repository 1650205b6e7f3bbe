//! Bug report draft and the fixed step table the wizard walks through.

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// One field of the fixed bug report schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Title,
    Description,
    Label,
    StepsToReproduce,
    ExpectedBehavior,
    ActualBehavior,
    Environment,
    AffectedModules,
    Attachments,
}

impl FieldKey {
    pub const ALL: [FieldKey; 9] = [
        FieldKey::Title,
        FieldKey::Description,
        FieldKey::Label,
        FieldKey::StepsToReproduce,
        FieldKey::ExpectedBehavior,
        FieldKey::ActualBehavior,
        FieldKey::Environment,
        FieldKey::AffectedModules,
        FieldKey::Attachments,
    ];

    /// Wire name, as used by the form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Label => "label",
            Self::StepsToReproduce => "stepsToReproduce",
            Self::ExpectedBehavior => "expectedBehavior",
            Self::ActualBehavior => "actualBehavior",
            Self::Environment => "environment",
            Self::AffectedModules => "affectedModules",
            Self::Attachments => "attachments",
        }
    }

    /// Struct field name on [`BugReportDraft`].
    fn field_name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Label => "label",
            Self::StepsToReproduce => "steps_to_reproduce",
            Self::ExpectedBehavior => "expected_behavior",
            Self::ActualBehavior => "actual_behavior",
            Self::Environment => "environment",
            Self::AffectedModules => "affected_modules",
            Self::Attachments => "attachments",
        }
    }

    pub fn is_required(&self) -> bool {
        REQUIRED_FIELDS.contains(self)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldKey {
    type Err = String;

    /// Accepts both the wire name and the struct field name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s || key.field_name() == s)
            .ok_or_else(|| format!("Unknown field: {}", s))
    }
}

/// Fields that must be non-empty before the report can be classified.
pub const REQUIRED_FIELDS: [FieldKey; 4] = [
    FieldKey::Title,
    FieldKey::Description,
    FieldKey::StepsToReproduce,
    FieldKey::Environment,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub field: FieldKey,
    pub label: &'static str,
}

/// Traversal order of the wizard.
pub const STEPS: [StepDefinition; 9] = [
    StepDefinition {
        field: FieldKey::Title,
        label: "Bug Title",
    },
    StepDefinition {
        field: FieldKey::Description,
        label: "Bug Description",
    },
    StepDefinition {
        field: FieldKey::Label,
        label: "Label (Bug, Feature, Enhancement)",
    },
    StepDefinition {
        field: FieldKey::StepsToReproduce,
        label: "Steps to Reproduce",
    },
    StepDefinition {
        field: FieldKey::ExpectedBehavior,
        label: "Expected Behavior",
    },
    StepDefinition {
        field: FieldKey::ActualBehavior,
        label: "Actual Behavior",
    },
    StepDefinition {
        field: FieldKey::Environment,
        label: "Environment (OS, Browser, etc.)",
    },
    StepDefinition {
        field: FieldKey::AffectedModules,
        label: "Affected Modules/Components",
    },
    StepDefinition {
        field: FieldKey::Attachments,
        label: "Attachments (Screenshots, Logs, etc.)",
    },
];

pub const LAST_STEP: usize = STEPS.len() - 1;

/// In-progress bug report. Empty string means "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BugReportDraft {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub label: String,
    #[validate(length(min = 1))]
    pub steps_to_reproduce: String,
    pub expected_behavior: String,
    pub actual_behavior: String,
    #[validate(length(min = 1))]
    pub environment: String,
    pub affected_modules: String,
    pub attachments: String,
}

impl BugReportDraft {
    pub fn get(&self, key: FieldKey) -> &str {
        match key {
            FieldKey::Title => &self.title,
            FieldKey::Description => &self.description,
            FieldKey::Label => &self.label,
            FieldKey::StepsToReproduce => &self.steps_to_reproduce,
            FieldKey::ExpectedBehavior => &self.expected_behavior,
            FieldKey::ActualBehavior => &self.actual_behavior,
            FieldKey::Environment => &self.environment,
            FieldKey::AffectedModules => &self.affected_modules,
            FieldKey::Attachments => &self.attachments,
        }
    }

    pub fn set(&mut self, key: FieldKey, value: String) {
        let slot = match key {
            FieldKey::Title => &mut self.title,
            FieldKey::Description => &mut self.description,
            FieldKey::Label => &mut self.label,
            FieldKey::StepsToReproduce => &mut self.steps_to_reproduce,
            FieldKey::ExpectedBehavior => &mut self.expected_behavior,
            FieldKey::ActualBehavior => &mut self.actual_behavior,
            FieldKey::Environment => &mut self.environment,
            FieldKey::AffectedModules => &mut self.affected_modules,
            FieldKey::Attachments => &mut self.attachments,
        };
        *slot = value;
    }

    /// Required fields that are currently empty, in [`REQUIRED_FIELDS`] order.
    pub fn missing_required(&self) -> ValidationResult {
        let errors = match self.validate() {
            Ok(()) => return ValidationResult::default(),
            Err(errors) => errors,
        };

        let failing: Vec<FieldKey> = errors
            .field_errors()
            .keys()
            .filter_map(|name| name.to_string().parse::<FieldKey>().ok())
            .collect();

        ValidationResult(
            REQUIRED_FIELDS
                .into_iter()
                .filter(|key| failing.contains(key))
                .collect(),
        )
    }
}

/// Required fields that failed the last submit attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationResult(Vec<FieldKey>);

impl ValidationResult {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.0.contains(&key)
    }

    pub fn fields(&self) -> &[FieldKey] {
        &self.0
    }
}
