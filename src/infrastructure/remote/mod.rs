//! Calls to sibling services.

mod rest_client;

pub use rest_client::{FORWARDED_HEADERS, RemoteError, RestClient};
