//! Response wrappers shared by the OTP services and their callers

pub mod response;

pub use response::OtpResponse;
