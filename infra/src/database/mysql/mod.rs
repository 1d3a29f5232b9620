//! MySQL implementations of the core store traits

pub mod otp_repository_impl;

pub use otp_repository_impl::MySqlOtpRepository;
