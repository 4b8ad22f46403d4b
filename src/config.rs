use serde::Deserialize;

/// Default PostHog ingestion host when POSTHOG_HOST is not set.
const DEFAULT_POSTHOG_HOST: &str = "https://us.i.posthog.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// PostHog project API key. When absent the tracker never initializes,
    /// so analytics is a no-op regardless of consent.
    pub posthog_api_key: Option<String>,
    pub posthog_host: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            posthog_api_key: std::env::var("POSTHOG_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            posthog_host: std::env::var("POSTHOG_HOST")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("POSTHOG_HOST must start with http:// or https://");
                    }
                    Ok(url)
                })
                .transpose()?
                .unwrap_or_else(|| DEFAULT_POSTHOG_HOST.to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("PostHog host: {}", config.posthog_host);
        if config.posthog_api_key.is_some() {
            tracing::info!("PostHog API key configured, analytics available");
        } else {
            tracing::info!("No PostHog API key, analytics disabled");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
