// civicmap-api: Async HTTP client for the place-search service backing the map search bar.

pub mod error;
pub mod search;
pub mod transport;

pub use error::Error;
pub use search::{PlaceResponse, SearchClient};
pub use transport::TransportConfig;
