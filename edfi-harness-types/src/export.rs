//! Re-export of the crates appearing in the public API.

pub use futures;
pub use serde_json;
pub use time;
pub use url;
