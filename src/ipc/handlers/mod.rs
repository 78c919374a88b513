pub mod attendance;
pub mod backup;
pub mod class;
pub mod core;
pub mod reports;
pub mod roster;
