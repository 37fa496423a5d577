pub mod admission;
pub mod identity;

pub use admission::DrainGate;
pub use identity::{Caller, Identity};
