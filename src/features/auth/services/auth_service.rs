use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    LoginRequestDto, OtpChallengeDto, RegisterRequestDto, ResendOtpRequestDto, UserDto,
    VerifyOtpRequestDto, VerifyOtpResponseDto,
};
use crate::features::auth::models::{OtpPurpose, OtpVerification, User};
use crate::features::auth::services::token_service::TokenService;
use crate::features::auth::{otp, password};
use crate::modules::mailer::{EmailSender, OtpEmail};
use crate::shared::clock::Clock;
use crate::shared::constants::APP_NAME;

const INVALID_CREDENTIALS: &str = "Invalid email or password.";
const INVALID_OTP: &str = "Invalid OTP code.";

/// Service for registration, login and one-time-code verification
pub struct AuthService {
    pool: PgPool,
    token_service: Arc<TokenService>,
    mailer: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    otp_expiry: Duration,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        token_service: Arc<TokenService>,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        otp_expiry: std::time::Duration,
    ) -> Self {
        Self {
            pool,
            token_service,
            mailer,
            clock,
            otp_expiry: Duration::seconds(otp_expiry.as_secs() as i64),
        }
    }

    /// Register a new, inactive account and email its signup code
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<OtpChallengeDto> {
        let email = dto.email.trim().to_lowercase();
        let username = dto.username.trim().to_string();

        if self.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "A user with this email already exists.".to_string(),
            ));
        }

        let username_taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(&username)
                .fetch_one(&self.pool)
                .await?;
        if username_taken {
            return Err(AppError::Conflict(
                "A user with that username already exists.".to_string(),
            ));
        }

        let password_hash = password::hash_password_blocking(dto.password).await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, phone_number, password_hash, is_verified, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, FALSE)
            RETURNING *
            "#,
        )
        .bind(&username)
        .bind(&email)
        .bind(dto.first_name.trim())
        .bind(dto.last_name.trim())
        .bind(dto.phone_number.as_deref().unwrap_or(""))
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_db(e, "A user with this email or username already exists."))?;

        tracing::info!("User registered: id={}, email={}", user.id, user.email);

        match self.issue_otp(&user, OtpPurpose::Signup).await {
            Ok(challenge) => Ok(challenge),
            Err(e) => {
                tracing::warn!(
                    "Removing user {} after failed verification email: {}",
                    user.id,
                    e
                );
                sqlx::query("DELETE FROM users WHERE id = $1")
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
                Err(AppError::ExternalServiceError(
                    "Failed to send verification email. Please try again.".to_string(),
                ))
            }
        }
    }

    /// Check the password and email a login code
    pub async fn login(&self, dto: LoginRequestDto) -> Result<OtpChallengeDto> {
        let user = self
            .find_user_by_email(&dto.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        let valid =
            password::verify_password_blocking(dto.password, user.password_hash.clone()).await?;
        if !valid {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Self::ensure_can_sign_in(&user)?;

        self.issue_otp(&user, OtpPurpose::Login)
            .await
            .map_err(|e| {
                tracing::warn!("Login OTP for user {} not delivered: {}", user.id, e);
                AppError::ExternalServiceError("Failed to send OTP. Please try again.".to_string())
            })
    }

    /// Consume a code: activates the account (signup) or issues a token (login)
    pub async fn verify_otp(&self, dto: VerifyOtpRequestDto) -> Result<VerifyOtpResponseDto> {
        Self::ensure_supported(dto.purpose)?;

        if !otp::is_well_formed(dto.otp_code.trim()) {
            return Err(AppError::Validation(INVALID_OTP.to_string()));
        }

        let user = self
            .find_user_by_email(&dto.email)
            .await?
            .ok_or_else(|| AppError::Validation(INVALID_OTP.to_string()))?;

        let candidates = sqlx::query_as::<_, OtpVerification>(
            r#"
            SELECT * FROM otp_verifications
            WHERE user_id = $1 AND purpose = $2 AND is_used = FALSE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user.id)
        .bind(dto.purpose)
        .fetch_all(&self.pool)
        .await?;

        let record = candidates
            .into_iter()
            .find(|o| otp::code_matches(&dto.otp_code, &o.code_hash))
            .ok_or_else(|| AppError::Validation(INVALID_OTP.to_string()))?;

        if record.is_expired_at(self.clock.now()) {
            return Err(AppError::Validation("OTP has expired.".to_string()));
        }

        // Only one concurrent submission may consume the code
        let consumed = sqlx::query(
            "UPDATE otp_verifications SET is_used = TRUE WHERE id = $1 AND is_used = FALSE",
        )
        .bind(record.id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if consumed == 0 {
            return Err(AppError::Validation(INVALID_OTP.to_string()));
        }

        match dto.purpose {
            OtpPurpose::Signup => {
                let user = sqlx::query_as::<_, User>(
                    r#"
                    UPDATE users
                    SET is_active = TRUE, is_verified = TRUE, updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

                tracing::info!("User verified: id={}", user.id);

                Ok(VerifyOtpResponseDto {
                    purpose: OtpPurpose::Signup,
                    access_token: None,
                    token_type: None,
                    expires_in: None,
                    user: user.into(),
                })
            }
            OtpPurpose::Login => {
                Self::ensure_can_sign_in(&user)?;
                let token = self.token_service.issue(user.id, &user.email, user.role)?;

                tracing::info!("User logged in: id={}", user.id);

                Ok(VerifyOtpResponseDto {
                    purpose: OtpPurpose::Login,
                    access_token: Some(token.access_token),
                    token_type: Some("Bearer".to_string()),
                    expires_in: Some(token.expires_in),
                    user: user.into(),
                })
            }
            OtpPurpose::Reset => Err(Self::reset_unsupported()),
        }
    }

    /// Replace any outstanding code for the purpose with a new one
    pub async fn resend_otp(&self, dto: ResendOtpRequestDto) -> Result<OtpChallengeDto> {
        Self::ensure_supported(dto.purpose)?;

        let user = self
            .find_user_by_email(&dto.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        match dto.purpose {
            OtpPurpose::Signup => {
                if user.is_verified {
                    return Err(AppError::BadRequest(
                        "Account is already verified.".to_string(),
                    ));
                }
            }
            OtpPurpose::Login => {
                Self::ensure_can_sign_in(&user)?;

                // A pending login code proves the password was checked
                let pending: bool = sqlx::query_scalar(
                    r#"
                    SELECT EXISTS(
                        SELECT 1 FROM otp_verifications
                        WHERE user_id = $1 AND purpose = 'login' AND is_used = FALSE
                    )
                    "#,
                )
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

                if !pending {
                    return Err(AppError::BadRequest(
                        "No pending login verification. Please log in again.".to_string(),
                    ));
                }
            }
            OtpPurpose::Reset => return Err(Self::reset_unsupported()),
        }

        self.issue_otp(&user, dto.purpose).await.map_err(|e| {
            tracing::warn!("Resent OTP for user {} not delivered: {}", user.id, e);
            AppError::ExternalServiceError("Failed to send OTP".to_string())
        })
    }

    /// Get the authenticated user's account
    pub async fn me(&self, user_id: Uuid) -> Result<UserDto> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        Ok(user.into())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to look up user by email: {:?}", e);
                AppError::Database(e)
            })
    }

    /// Store a fresh code for `purpose` and email it
    async fn issue_otp(&self, user: &User, purpose: OtpPurpose) -> Result<OtpChallengeDto> {
        sqlx::query(
            "DELETE FROM otp_verifications WHERE user_id = $1 AND purpose = $2 AND is_used = FALSE",
        )
        .bind(user.id)
        .bind(purpose)
        .execute(&self.pool)
        .await?;

        let code = otp::generate_code();
        let expires_at = self.clock.now() + self.otp_expiry;

        sqlx::query(
            r#"
            INSERT INTO otp_verifications (user_id, code_hash, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id)
        .bind(otp::hash_code(&code))
        .bind(purpose)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let message = OtpEmail {
            first_name: &user.first_name,
            code: &code,
            purpose: purpose.email_label(),
            expiry_minutes: self.otp_expiry.num_minutes(),
            app_name: APP_NAME,
        }
        .render(&user.email)?;

        self.mailer.send(&message).await?;

        tracing::info!("OTP issued: user={}, purpose={}", user.id, purpose);

        Ok(OtpChallengeDto {
            email: user.email.clone(),
            purpose,
            expires_in_minutes: self.otp_expiry.num_minutes(),
        })
    }

    fn ensure_can_sign_in(user: &User) -> Result<()> {
        if !user.is_verified {
            return Err(AppError::Forbidden(
                "Please verify your email first.".to_string(),
            ));
        }
        if !user.is_active {
            return Err(AppError::Forbidden("Account is disabled.".to_string()));
        }
        Ok(())
    }

    fn ensure_supported(purpose: OtpPurpose) -> Result<()> {
        match purpose {
            OtpPurpose::Reset => Err(Self::reset_unsupported()),
            OtpPurpose::Signup | OtpPurpose::Login => Ok(()),
        }
    }

    fn reset_unsupported() -> AppError {
        AppError::BadRequest("Password reset is not supported.".to_string())
    }
}
