//! The generic REST controller and its request model.

mod input;
mod rest_controller;

pub use input::{RestInput, TRANSFORMER_PARAM};
pub use rest_controller::RestController;
