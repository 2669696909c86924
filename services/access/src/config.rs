/// Access service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AccessConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port to listen on (default 3113). Env var: `ACCESS_PORT`.
    pub access_port: u16,
    /// Expiry sweeper tick interval in seconds (default 60). Env var: `SWEEP_INTERVAL_SECS`.
    pub sweep_interval_secs: u64,
    /// Days a resolved code is kept before the retention purge deletes it
    /// (default 30). Env var: `RETENTION_DAYS`.
    pub retention_days: i64,
}

impl AccessConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            access_port: std::env::var("ACCESS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3113),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
            retention_days: std::env::var("RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
