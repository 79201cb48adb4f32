use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Settings for locally issued access tokens and one-time passwords
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry: Duration,
    pub jwt_leeway: Duration,
    pub otp_expiry: Duration,
}

// Keep the signing secret out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_expiry", &self.jwt_expiry)
            .field("jwt_leeway", &self.jwt_leeway)
            .field("otp_expiry", &self.otp_expiry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Which object store holds uploaded file contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    MinIO,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub local_root: PathBuf,
    pub minio: MinIOConfig,
}

/// MinIO/S3 storage configuration for file uploads
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Key prefix for every stored object (e.g., "files")
    pub prefix: String,
}

/// How OTP emails leave the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    Smtp,
    Http,
    Log,
}

#[derive(Clone)]
pub struct EmailConfig {
    pub backend: EmailBackend,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    pub gateway_url: Option<String>,
    pub gateway_token: Option<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("backend", &self.backend)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("gateway_url", &self.gateway_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            email: EmailConfig::from_env()?,
        })
    }
}

/// Read a numeric variable, falling back to `default` when unset
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024; // 50MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size = parse_env("MAX_UPLOAD_SIZE", Self::DEFAULT_MAX_UPLOAD_SIZE)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_upload_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const MIN_SECRET_LEN: usize = 32;
    const DEFAULT_JWT_EXPIRY_SECS: u64 = 86_400; // 1 day
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;
    const DEFAULT_OTP_EXPIRY_MINUTES: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;
        Self::check_secret(&jwt_secret)?;

        let jwt_issuer =
            env::var("JWT_ISSUER").unwrap_or_else(|_| "secure-file-manager".to_string());

        let jwt_expiry_secs = parse_env("JWT_EXPIRY_SECS", Self::DEFAULT_JWT_EXPIRY_SECS)?;
        let jwt_leeway_secs = parse_env("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;
        let otp_expiry_minutes =
            parse_env("OTP_EXPIRY_MINUTES", Self::DEFAULT_OTP_EXPIRY_MINUTES)?;

        Ok(Self {
            jwt_secret,
            jwt_issuer,
            jwt_expiry: Duration::from_secs(jwt_expiry_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
            otp_expiry: Duration::from_secs(otp_expiry_minutes * 60),
        })
    }

    fn check_secret(secret: &str) -> Result<(), String> {
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} bytes long",
                Self::MIN_SECRET_LEN
            ));
        }
        Ok(())
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Secure File Manager API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for Secure File Manager".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "minio" | "s3" => Ok(Self::MinIO),
            other => Err(format!(
                "STORAGE_BACKEND must be 'local' or 'minio', got '{}'",
                other
            )),
        }
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, String> {
        let backend = StorageBackend::parse(
            &env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string()),
        )?;

        let local_root = env::var("STORAGE_LOCAL_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./media"));

        Ok(Self {
            backend,
            local_root,
            minio: MinIOConfig::from_env()?,
        })
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket =
            env::var("MINIO_BUCKET").unwrap_or_else(|_| "secure-file-manager".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let prefix = env::var("MINIO_PREFIX").unwrap_or_else(|_| "files".to_string());

        Ok(Self {
            endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            prefix,
        })
    }
}

impl EmailBackend {
    fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "http" => Ok(Self::Http),
            "log" => Ok(Self::Log),
            other => Err(format!(
                "EMAIL_BACKEND must be 'smtp', 'http' or 'log', got '{}'",
                other
            )),
        }
    }
}

impl EmailConfig {
    const DEFAULT_SMTP_PORT: u16 = 587;

    pub fn from_env() -> Result<Self, String> {
        let backend =
            EmailBackend::parse(&env::var("EMAIL_BACKEND").unwrap_or_else(|_| "log".to_string()))?;

        let gateway_url = env::var("EMAIL_GATEWAY_URL").ok().filter(|s| !s.is_empty());
        if backend == EmailBackend::Http && gateway_url.is_none() {
            return Err("EMAIL_GATEWAY_URL is required when EMAIL_BACKEND=http".to_string());
        }

        let smtp_host = env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string());
        if backend == EmailBackend::Smtp && smtp_host.is_empty() {
            return Err("SMTP_HOST is required when EMAIL_BACKEND=smtp".to_string());
        }

        Ok(Self {
            backend,
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", Self::DEFAULT_SMTP_PORT)?,
            smtp_username: env::var("SMTP_USERNAME").unwrap_or_default(),
            smtp_password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@secure-file-manager.local".to_string()),
            from_name: env::var("EMAIL_FROM_NAME")
                .unwrap_or_else(|_| "Secure File Manager".to_string()),
            gateway_url,
            gateway_token: env::var("EMAIL_GATEWAY_TOKEN").ok().filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("local"), Ok(StorageBackend::Local));
        assert_eq!(StorageBackend::parse(" MinIO "), Ok(StorageBackend::MinIO));
        assert_eq!(StorageBackend::parse("s3"), Ok(StorageBackend::MinIO));
        assert!(StorageBackend::parse("ftp").is_err());
    }

    #[test]
    fn test_email_backend_parse() {
        assert_eq!(EmailBackend::parse("smtp"), Ok(EmailBackend::Smtp));
        assert_eq!(EmailBackend::parse("HTTP"), Ok(EmailBackend::Http));
        assert_eq!(EmailBackend::parse("log"), Ok(EmailBackend::Log));
        assert!(EmailBackend::parse("pigeon").is_err());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        assert!(AuthConfig::check_secret("too-short").is_err());
        assert!(AuthConfig::check_secret(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_auth_config_debug_hides_secret() {
        let config = AuthConfig {
            jwt_secret: "super-secret-value-that-must-not-leak".to_string(),
            jwt_issuer: "issuer".to_string(),
            jwt_expiry: Duration::from_secs(60),
            jwt_leeway: Duration::from_secs(0),
            otp_expiry: Duration::from_secs(600),
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
    }
}
