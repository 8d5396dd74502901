pub mod coordinator;
pub mod enhance;
