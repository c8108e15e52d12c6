use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub swagger: SwaggerConfig,
    pub s3: S3Config,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Global route prefix (e.g. "api")
    pub api_prefix: String,
    /// URI version segment without the leading "v" (e.g. "1")
    pub api_version: String,
    /// Deployment stage tag, prepended to every object key
    pub environment: String,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Apply pending migrations on startup
    pub synchronize: bool,
    /// Session time zone applied to every pooled connection
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// S3 storage configuration for file uploads
#[derive(Debug, Clone)]
pub struct S3Config {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    /// S3-compatible endpoint (MinIO, localstack). `None` means AWS itself.
    pub endpoint: Option<String>,
    /// Key prefix separating deployment environments sharing one bucket
    pub environment_prefix: String,
    /// Upper bound for a single store call
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment only; `.env` is loaded once in `main`
    pub fn from_env() -> Result<Self, String> {
        let app = AppConfig::from_env()?;
        let database = DatabaseConfig::from_env(&app.timezone)?;
        let s3 = S3Config::from_env(&app.environment)?;

        Ok(Config {
            cors: CorsConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            app,
            database,
            s3,
        })
    }
}

impl AppConfig {
    const DEFAULT_TIMEZONE: &'static str = "Asia/Jakarta";

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid API_PORT: {}", e))?;

        let api_prefix = env::var("API_PREFIX")
            .unwrap_or_else(|_| "api".to_string())
            .trim_matches('/')
            .to_string();

        let api_version = env::var("API_VERSION")
            .unwrap_or_else(|_| "1".to_string())
            .trim_start_matches('v')
            .to_string();

        let environment = env::var("NODE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_default();

        let timezone =
            env::var("APP_TIMEZONE").unwrap_or_else(|_| Self::DEFAULT_TIMEZONE.to_string());

        Ok(Self {
            host,
            port,
            api_prefix,
            api_version,
            environment,
            timezone,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base path every API route is nested under, e.g. `/api/v1`
    pub fn base_path(&self) -> String {
        if self.api_prefix.is_empty() {
            format!("/v{}", self.api_version)
        } else {
            format!("/{}/v{}", self.api_prefix, self.api_version)
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl CorsConfig {
    const DEFAULT_METHODS: &'static str = "GET,HEAD,PUT,PATCH,POST,DELETE,OPTIONS";
    const DEFAULT_HEADERS: &'static str =
        "Content-Type, Access-Control-Allow-Headers, Authorization, X-Requested-With, x-lang";

    pub fn from_env() -> Result<Self, String> {
        let allowed_origins = split_list(
            &env::var("CORS_OPTION_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        );

        Ok(Self {
            allowed_origins,
            allowed_methods: split_list(Self::DEFAULT_METHODS),
            allowed_headers: split_list(Self::DEFAULT_HEADERS),
            exposed_headers: vec!["Content-Disposition".to_string()],
            allow_credentials: true,
        })
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env(timezone: &str) -> Result<Self, String> {
        let url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => Self::url_from_parts()?,
        };

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        let synchronize = env::var("DB_SYNCHRONIZE")
            .map(|v| v == "true")
            .unwrap_or(false);

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            synchronize,
            timezone: timezone.to_string(),
        })
    }

    /// Build a connection URL from the discrete DB_* variables
    fn url_from_parts() -> Result<String, String> {
        let host = env::var("DB_HOST")
            .map_err(|_| "DATABASE_URL or DB_HOST must be set".to_string())?;
        let port = env::var("DB_PORT")
            .unwrap_or_else(|_| "5432".to_string())
            .parse::<u16>()
            .map_err(|_| "DB_PORT must be a valid port number".to_string())?;
        let username = env::var("DB_USERNAME").unwrap_or_else(|_| "postgres".to_string());
        let password = env::var("DB_PASSWORD").unwrap_or_default();
        let name = env::var("DB_NAME").map_err(|_| "DB_NAME must be set".to_string())?;

        Ok(format!(
            "postgres://{}:{}@{}:{}/{}",
            username, password, host, port, name
        ))
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());

        Ok(Self { username, password })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl S3Config {
    const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn from_env(environment_prefix: &str) -> Result<Self, String> {
        let access_key = env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| "AWS_ACCESS_KEY_ID environment variable is required".to_string())?;

        let secret_key = env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| "AWS_SECRET_ACCESS_KEY environment variable is required".to_string())?;

        let region = env::var("AWS_REGION").unwrap_or_else(|_| "ap-southeast-1".to_string());

        let bucket = env::var("AWS_S3_BUCKET")
            .map_err(|_| "AWS_S3_BUCKET environment variable is required".to_string())?;

        let endpoint = env::var("AWS_S3_ENDPOINT").ok().filter(|s| !s.is_empty());

        let timeout_secs = env::var("AWS_S3_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "AWS_S3_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            access_key,
            secret_key,
            region,
            bucket,
            endpoint,
            environment_prefix: environment_prefix.to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_config(prefix: &str, version: &str) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_prefix: prefix.to_string(),
            api_version: version.to_string(),
            environment: String::new(),
            timezone: "Asia/Jakarta".to_string(),
        }
    }

    #[test]
    fn test_base_path() {
        assert_eq!(app_config("api", "1").base_path(), "/api/v1");
        assert_eq!(app_config("", "2").base_path(), "/v2");
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(
            split_list(CorsConfig::DEFAULT_HEADERS).last().map(String::as_str),
            Some("x-lang")
        );
    }
}
