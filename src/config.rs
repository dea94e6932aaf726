use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    /// Lifetime of issued access tokens.
    pub token_ttl_hours: i64,
    /// Password given to the `admin` login when no super admin exists yet.
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("LEDGERLINE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid LEDGERLINE_HOST: {e}"))?;

        let port: u16 = env_or("LEDGERLINE_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid LEDGERLINE_PORT: {e}"))?;

        let max_body_size: usize = env_or("LEDGERLINE_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid LEDGERLINE_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("LEDGERLINE_LOG_LEVEL", "info");

        let token_ttl_hours: i64 = env_or("LEDGERLINE_TOKEN_TTL_HOURS", "24")
            .parse()
            .map_err(|e| format!("Invalid LEDGERLINE_TOKEN_TTL_HOURS: {e}"))?;
        if token_ttl_hours <= 0 {
            return Err("LEDGERLINE_TOKEN_TTL_HOURS must be positive".to_string());
        }

        let admin_password = env_or("LEDGERLINE_ADMIN_PASSWORD", "admin");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            max_body_size,
            log_level,
            token_ttl_hours,
            admin_password,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
