//! Client layer: typed access to the backend endpoints over a pluggable [`Transport`].

mod api;
mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod stub;
mod transport;

pub use api::{ApiClient, inventory_target, search_target};
pub use error::ApiError;
pub use transport::{HttpTransport, Reply, Transport};
