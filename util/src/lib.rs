mod logger;
mod random;

pub use crate::logger::setup;
pub use crate::random::fork_rng;
