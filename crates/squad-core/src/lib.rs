pub mod cache;
pub mod config;
pub mod decision;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod io;
pub mod log;
pub mod paths;
pub mod roster;
pub mod search;
pub mod squad;
pub mod status;
pub mod task;
pub mod text;
pub mod types;

pub use cache::SquadCache;
pub use error::{Result, SquadError};
pub use squad::Squad;
