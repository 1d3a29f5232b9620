//! Passcode record store module.

mod r#trait;
pub use r#trait::{AttemptOutcome, OtpRepository, ReplaceOutcome};

mod memory;
pub use memory::InMemoryOtpRepository;
