mod otp_verification;
mod user;

pub use otp_verification::{OtpPurpose, OtpVerification};
pub use user::User;
