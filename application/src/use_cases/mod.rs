//! Use cases - the orchestration flows of the application layer.

pub mod run_automation;

pub use run_automation::RunAutomationUseCase;
