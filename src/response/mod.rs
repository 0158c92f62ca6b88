//! Uniform response formatting.
//!
//! Every endpoint answers with an [`Envelope`]. Failures carry a [`RestCode`]
//! whose default message can be overridden per response; transformed payloads
//! travel as a [`Resource`] until metadata has been attached.

mod code;
mod envelope;
mod resource;

pub use code::RestCode;
pub use envelope::Envelope;
pub use resource::{Pagination, Resource};
