//! Tower Service implementations

pub mod core;
pub mod request;
pub mod response;

pub use core::{normalize_messages, select_agent_text, A2aAdapterService};
pub use request::A2aRequest;
pub use response::A2aResponse;
