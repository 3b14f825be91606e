pub mod config;
pub mod decisions;
pub mod logs;
pub mod members;
pub mod overview;
pub mod tasks;
pub mod velocity;
