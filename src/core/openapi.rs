use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::access::{dtos as access_dtos, handlers as access_handlers, models as access_models};
use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::auth;
use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::features::settings::dtos as settings_dtos;
use crate::features::users::{dtos as users_dtos, handlers::profile_handler};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::verify_otp,
        auth::handlers::resend_otp,
        auth::handlers::get_me,
        // Users
        profile_handler::get_profile,
        profile_handler::update_profile,
        // Files
        files_handlers::list_my_files,
        files_handlers::upload_file,
        files_handlers::get_file,
        files_handlers::download_file,
        files_handlers::update_file,
        files_handlers::delete_file,
        files_handlers::toggle_favorite,
        files_handlers::shared_with_me,
        files_handlers::public_files,
        access_handlers::check_access,
        // Sharing
        files_handlers::share_file,
        files_handlers::list_grants,
        files_handlers::remove_access,
        // Categories
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::delete_category,
        // Dashboard
        dashboard_handlers::home,
        // Admin
        admin_handlers::list_users,
        admin_handlers::toggle_user_status,
        admin_handlers::list_files,
        admin_handlers::delete_file,
        admin_handlers::system_stats,
        admin_handlers::list_settings,
        admin_handlers::update_setting,
        admin_handlers::list_user_activities,
    ),
    components(
        schemas(
            Meta,
            // Auth
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::VerifyOtpRequestDto,
            auth::dtos::ResendOtpRequestDto,
            auth::dtos::OtpChallengeDto,
            auth::dtos::VerifyOtpResponseDto,
            auth::dtos::UserDto,
            auth::models::OtpPurpose,
            ApiResponse<auth::dtos::OtpChallengeDto>,
            ApiResponse<auth::dtos::VerifyOtpResponseDto>,
            ApiResponse<auth::dtos::UserDto>,
            // Users
            users_dtos::UpdateProfileDto,
            // Access
            access_models::UserRole,
            access_models::Visibility,
            access_models::PermissionLevel,
            access_models::Operation,
            access_dtos::FilePermissionsDto,
            ApiResponse<access_dtos::FilePermissionsDto>,
            // Files
            files_dtos::TypeGroup,
            files_dtos::UploadFileDto,
            files_dtos::FileResponseDto,
            files_dtos::FileDetailDto,
            files_dtos::UpdateFileDto,
            files_dtos::FileStatsDto,
            files_dtos::MyFilesDto,
            files_dtos::PublicFilesDto,
            files_dtos::FavoriteDto,
            files_dtos::FileActivityDto,
            files_models::FileAction,
            ApiResponse<files_dtos::FileResponseDto>,
            ApiResponse<Vec<files_dtos::FileResponseDto>>,
            ApiResponse<files_dtos::FileDetailDto>,
            ApiResponse<files_dtos::MyFilesDto>,
            ApiResponse<files_dtos::PublicFilesDto>,
            ApiResponse<files_dtos::FavoriteDto>,
            // Sharing
            files_dtos::ShareFileDto,
            files_dtos::GrantResponseDto,
            ApiResponse<files_dtos::GrantResponseDto>,
            ApiResponse<Vec<files_dtos::GrantResponseDto>>,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CreateCategoryDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            // Dashboard
            dashboard_dtos::UserStatsDto,
            dashboard_dtos::GlobalStatsDto,
            dashboard_dtos::DashboardDto,
            ApiResponse<dashboard_dtos::DashboardDto>,
            // Settings
            settings_dtos::SettingResponseDto,
            settings_dtos::UpdateSettingDto,
            ApiResponse<settings_dtos::SettingResponseDto>,
            ApiResponse<Vec<settings_dtos::SettingResponseDto>>,
            // Admin
            admin_dtos::UserStatus,
            admin_dtos::AdminUserDto,
            admin_dtos::UserStatusDto,
            admin_dtos::FileTypeCountDto,
            admin_dtos::TopUserDto,
            admin_dtos::SystemStatsDto,
            admin_dtos::UserActivityDto,
            ApiResponse<Vec<admin_dtos::AdminUserDto>>,
            ApiResponse<admin_dtos::UserStatusDto>,
            ApiResponse<admin_dtos::SystemStatsDto>,
            ApiResponse<Vec<admin_dtos::UserActivityDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and email OTP verification"),
        (name = "users", description = "User profile management"),
        (name = "files", description = "File upload, download and management"),
        (name = "sharing", description = "Per-user access grants on restricted files"),
        (name = "categories", description = "File categories"),
        (name = "dashboard", description = "Home dashboard"),
        (name = "admin", description = "Admin endpoints (admin role only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Secure File Manager API",
        version = "0.1.0",
        description = "API documentation for Secure File Manager",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
