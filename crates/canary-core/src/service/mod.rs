pub mod drain;
pub mod lock;
