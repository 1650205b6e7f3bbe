pub mod classify;
pub mod wizard;
