pub mod controller;
pub mod error;
pub mod evaluator;
pub mod handlers;
pub mod machine;
pub mod models;
pub mod orchestrator;
pub mod persistence;
pub mod scoring;
pub mod summary;
pub mod timer;
pub mod validation;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::SessionController;
pub use error::InterviewError;
pub use orchestrator::InterviewConfig;
