//! Place resolution: the place-search seam, fixed-delay retry, cancellation, and the entity resolver.

pub mod cancel;
mod error;
pub mod resolver;
pub mod retry;
mod source;

#[cfg(feature = "http")]
pub mod http;

pub use cancel::{CancelHandle, CancelSignal, Cancelled, cancel_pair};
pub use error::PlacesError;
pub use resolver::EntityResolver;
pub use source::PlaceSearch;

#[cfg(feature = "http")]
pub use http::PlacesHttpClient;
