pub mod auth_handler;

pub use auth_handler::{
    __path_get_me, __path_login, __path_register, __path_resend_otp, __path_verify_otp, get_me,
    login, register, resend_otp, verify_otp,
};
