pub mod bug_report;
pub mod classification;
pub mod error;
pub mod llm_config;
pub mod wizard;
