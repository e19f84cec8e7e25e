//! Guild tags: name reservation, lookup cache, reply collection and the command
//! workflows built on top of them.

mod cache;
mod collector;
mod render;
mod reservation;
mod workflow;

pub use collector::ReplyCollector;
pub use workflow::{TagWorkflow, WorkflowSettings};
