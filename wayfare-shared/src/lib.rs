pub mod dates;
pub mod money;
pub mod secrets;

pub use money::{round1, round2};
pub use secrets::Masked;
