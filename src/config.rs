use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET is not set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mealplanner".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "mealplanner-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        Ok(Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT", 8080),
            jwt,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("MEALPLANNER_TEST_PORT", "not-a-port");
        assert_eq!(env_parse::<u16>("MEALPLANNER_TEST_PORT", 8080), 8080);
        std::env::set_var("MEALPLANNER_TEST_PORT", "9090");
        assert_eq!(env_parse::<u16>("MEALPLANNER_TEST_PORT", 8080), 9090);
        std::env::remove_var("MEALPLANNER_TEST_PORT");
    }

    #[test]
    fn listen_addr_joins_host_and_port() {
        let cfg = AppConfig {
            database_url: "postgres://localhost/test".into(),
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 3000,
            jwt: JwtConfig {
                secret: "s".into(),
                issuer: "i".into(),
                audience: "a".into(),
                ttl_minutes: 1,
                refresh_ttl_minutes: 2,
            },
        };
        assert_eq!(cfg.listen_addr(), "127.0.0.1:3000");
    }
}
