use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub trusted_proxies: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    pub cache_sweep_interval_secs: u64,
    pub instance_retention_secs: u64,
    pub instance_cleanup_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意键值来源构造配置，解析失败的数值回退到默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self, env::VarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |name: &str, default: u64| -> u64 {
            lookup(name)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Ok(Config {
            database_url: lookup("DATABASE_URL").ok_or(env::VarError::NotPresent)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: lookup("SERVER_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(8080),
            // 负数配额等同于 0
            rate_limit_requests: lookup("RATE_LIMIT_REQUESTS")
                .and_then(|v| v.trim().parse::<i64>().ok())
                .map(|n| n.clamp(0, u32::MAX as i64) as u32)
                .unwrap_or(3),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW", 43200),
            trusted_proxies: lookup("TRUSTED_PROXIES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or_else(|| vec!["*".to_string()]),
            cache_sweep_interval_secs: parse_or("CACHE_SWEEP_INTERVAL", 300),
            instance_retention_secs: parse_or("INSTANCE_RETENTION", 48 * 3600),
            instance_cleanup_interval_secs: parse_or("INSTANCE_CLEANUP_INTERVAL", 24 * 3600),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }

    pub fn instance_retention(&self) -> Duration {
        Duration::from_secs(self.instance_retention_secs)
    }

    pub fn instance_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.instance_cleanup_interval_secs)
    }
}

// 逗号分隔列表，忽略空项
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, env::VarError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert!(config_from(&[]).is_err());
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/analytics")]).unwrap();
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.rate_limit_requests, 3);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(43200));
        assert!(config.trusted_proxies.is_empty());
        assert_eq!(config.cors_allowed_origins, vec!["*"]);
        assert_eq!(config.instance_retention(), Duration::from_secs(172800));
    }

    #[test]
    fn lists_and_numbers_are_parsed() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/analytics"),
            ("RATE_LIMIT_REQUESTS", "10"),
            ("RATE_LIMIT_WINDOW", "not-a-number"),
            ("TRUSTED_PROXIES", " 10.0.0.1, ,172.16.0.2 "),
            ("CORS_ALLOWED_ORIGINS", "https://a.example,https://b.example"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit_requests, 10);
        assert_eq!(config.rate_limit_window_secs, 43200);
        assert_eq!(config.trusted_proxies, vec!["10.0.0.1", "172.16.0.2"]);
        assert_eq!(config.cors_allowed_origins.len(), 2);
    }

    #[test]
    fn negative_limit_clamps_to_zero() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/analytics"),
            ("RATE_LIMIT_REQUESTS", "-1"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit_requests, 0);

        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/analytics"),
            ("RATE_LIMIT_REQUESTS", "99999999999"),
        ])
        .unwrap();
        assert_eq!(config.rate_limit_requests, u32::MAX);
    }
}
