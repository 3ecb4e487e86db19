//! Agent System
//!
//! - **Dataset Assistant**: answers questions on a dataset detail page
//!
//! The assistant is simulated: replies come from keyword matching against the
//! question and the dataset record, not from a model call.

pub mod assistant;

pub use assistant::{DatasetAssistant, ReplyTopic};
