pub mod use_cases;

pub use use_cases::classify::ClassifyUseCase;
pub use use_cases::wizard::{SubmitOutcome, WizardController};
