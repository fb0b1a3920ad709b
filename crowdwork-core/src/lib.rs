//! The core of the crowdwork session synchronizer: the data model of a dancefloor,
//! the reconciliation rules for its local copy, and the seams to the outside world.

mod backend;
mod config;
mod events;
mod guard;
mod model;
mod partitions;
mod state;
mod transport;
mod util;
mod validation;

pub use backend::*;
pub use config::*;
pub use events::*;
pub use guard::*;
pub use model::*;
pub use partitions::*;
pub use state::*;
pub use transport::*;
pub use util::*;
pub use validation::*;
