use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    LoginRequestDto, OtpChallengeDto, RegisterRequestDto, ResendOtpRequestDto, UserDto,
    VerifyOtpRequestDto, VerifyOtpResponseDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

/// Register a new user
///
/// The account stays inactive until the emailed signup code is verified.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "User registered, verification code sent", body = ApiResponse<OtpChallengeDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or username already registered"),
        (status = 502, description = "Verification email could not be sent")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<OtpChallengeDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let challenge = service.register(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(challenge),
            Some("Registration successful! Please check your email for OTP verification.".to_string()),
            None,
        )),
    ))
}

/// Login with email and password
///
/// A correct password sends a login code; the token comes from `/api/auth/verify-otp`.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login code sent", body = ApiResponse<OtpChallengeDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified or account disabled")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<OtpChallengeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let challenge = service.login(dto).await?;
    Ok(Json(ApiResponse::success(
        Some(challenge),
        Some("OTP sent to your email. Please verify to login.".to_string()),
        None,
    )))
}

/// Verify a signup or login code
#[utoipa::path(
    post,
    path = "/api/auth/verify-otp",
    request_body = VerifyOtpRequestDto,
    responses(
        (status = 200, description = "Code accepted", body = ApiResponse<VerifyOtpResponseDto>),
        (status = 400, description = "Invalid or expired code")
    ),
    tag = "auth"
)]
pub async fn verify_otp(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<VerifyOtpRequestDto>,
) -> Result<Json<ApiResponse<VerifyOtpResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let response = service.verify_otp(dto).await?;
    Ok(Json(ApiResponse::success(Some(response), None, None)))
}

/// Send a new signup or login code
#[utoipa::path(
    post,
    path = "/api/auth/resend-otp",
    request_body = ResendOtpRequestDto,
    responses(
        (status = 200, description = "New code sent", body = ApiResponse<OtpChallengeDto>),
        (status = 400, description = "Nothing to resend"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn resend_otp(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<ResendOtpRequestDto>,
) -> Result<Json<ApiResponse<OtpChallengeDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let challenge = service.resend_otp(dto).await?;
    Ok(Json(ApiResponse::success(
        Some(challenge),
        Some("OTP resent successfully".to_string()),
        None,
    )))
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<UserDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    user: AuthenticatedUser,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<UserDto>>> {
    let user_data = service.me(user.user_id).await?;
    Ok(Json(ApiResponse::success(Some(user_data), None, None)))
}
