/// Default upper bound on rows returned by the read API.
pub const DEFAULT_ANALYTICS_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub geoip_path: String,
    pub auth_mode: AuthMode,
    /// Maximum rows served by `GET /api/analytics` and the summary endpoint.
    pub analytics_limit: usize,
    pub duckdb_memory_limit: String,
}

/// Access policy for the read API.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMode {
    /// No token configured: read endpoints are open.
    None,
    /// Holds the bearer token read from `TALLY_ANALYTICS_TOKEN`.
    Token(String),
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: std::env::var("TALLY_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: std::env::var("TALLY_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            geoip_path: std::env::var("TALLY_GEOIP_PATH")
                .unwrap_or_else(|_| "./GeoLite2-City.mmdb".to_string()),
            auth_mode: match std::env::var("TALLY_ANALYTICS_TOKEN") {
                Ok(token) if !token.trim().is_empty() => AuthMode::Token(token.trim().to_string()),
                _ => AuthMode::None,
            },
            analytics_limit: match std::env::var("TALLY_ANALYTICS_LIMIT") {
                Ok(raw) => parse_limit(&raw)?,
                Err(_) => DEFAULT_ANALYTICS_LIMIT,
            },
            duckdb_memory_limit: std::env::var("TALLY_DUCKDB_MEMORY")
                .unwrap_or_else(|_| "1GB".to_string()),
        })
    }

    /// Resolve a caller-requested row count against the configured bound.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.analytics_limit)
            .clamp(1, self.analytics_limit.max(1))
    }
}

fn parse_limit(raw: &str) -> Result<usize, String> {
    let limit: usize = raw
        .trim()
        .parse()
        .map_err(|e| format!("invalid analytics limit: {e}"))?;
    if limit == 0 {
        return Err("analytics limit must be at least 1".to_string());
    }
    Ok(limit)
}
