//! Tower Layer implementations for the A2A adapter

pub mod validation;

pub use validation::{EnvelopeValidationLayer, EnvelopeValidationService};
