use std::env;
use std::net::SocketAddr;

/// SMTP settings for the verification mailer
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

/// Service configuration, loaded from the environment
///
/// Constructed once in `main` and injected; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Session token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Verification code lifetime in seconds
    pub code_ttl_secs: i64,
    /// Required suffix on registration emails, e.g. `@csu.fullerton.edu`
    pub email_domain: String,
    pub smtp: Option<SmtpConfig>,
    /// Base URL of the external payment processor
    pub payment_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: "dev-secret".to_string(),
            token_ttl_secs: 7 * 24 * 3600,
            code_ttl_secs: 15 * 60,
            email_domain: "@csu.fullerton.edu".to_string(),
            smtp: None,
            payment_url: "http://localhost:8081".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// development defaults for anything unset.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.bind_addr,
        };

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!("JWT_SECRET not set, using development default");
                defaults.jwt_secret
            }
        };

        let smtp = match (
            env::var("SMTP_HOST"),
            env::var("SMTP_USER"),
            env::var("SMTP_PASSWORD"),
        ) {
            (Ok(host), Ok(username), Ok(password)) => {
                let from = env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());
                Some(SmtpConfig {
                    host,
                    username,
                    password,
                    from,
                })
            }
            _ => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl_secs: parse_or("JWT_TTL_SECS", defaults.token_ttl_secs)?,
            code_ttl_secs: parse_or("VERIFICATION_CODE_TTL_SECS", defaults.code_ttl_secs)?,
            email_domain: env::var("CAMPUS_EMAIL_DOMAIN")
                .map(|d| d.to_lowercase())
                .unwrap_or(defaults.email_domain),
            smtp,
            payment_url: env::var("PAYMENT_SERVICE_URL").unwrap_or(defaults.payment_url),
        })
    }
}

fn parse_or(key: &str, default: i64) -> Result<i64, anyhow::Error> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}: {e}")),
        Err(_) => Ok(default),
    }
}
