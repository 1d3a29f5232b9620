//! Value objects: immutable descriptors without identity.

pub mod otp_key;
pub mod purpose;

pub use otp_key::OtpKey;
pub use purpose::OtpPurpose;
