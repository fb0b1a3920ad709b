//! Concrete collaborators for the crowdwork synchronizer.

mod backends;
mod stores;
mod transports;

pub use backends::*;
pub use stores::*;
pub use transports::*;
