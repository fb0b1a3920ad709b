mod message;
mod profile;
mod request;

pub use message::*;
pub use profile::*;
pub use request::*;

/// The backend identifier of a dancefloor session.
pub type SessionId = String;
