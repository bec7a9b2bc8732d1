mod client;
mod error;
mod events;
mod username;

pub use client::Client;
pub use error::FetchError;
pub use events::{CreatedRef, Event, EventKind};
pub use username::Username;

pub(crate) mod prelude {
    pub use super::Client;
    pub use super::Username;
}
