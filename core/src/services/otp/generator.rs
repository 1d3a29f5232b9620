//! Passcode generation

use rand::{rngs::OsRng, Rng};

use crate::domain::entities::otp_record::{CODE_MAX, CODE_MIN};

/// Generate a cryptographically secure 6-digit passcode
///
/// Draws uniformly from `[100000, 999999]` using the OS CSPRNG. `gen_range`
/// rejects out-of-zone samples, so no value is favoured.
pub fn generate_secure_code() -> String {
    let mut rng = OsRng;
    let code: u32 = rng.gen_range(CODE_MIN..=CODE_MAX);
    code.to_string()
}
