use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tf_core::PollPolicy;

/// Backend URL used when nothing is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8188";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend_url: String,
    /// Timeout for submit/fetch/upload calls.
    pub request_timeout: Duration,
    /// Timeout for resource listings (cheap, should answer fast).
    pub list_timeout: Duration,
    pub output_dir: PathBuf,
    pub policy: PollPolicy,
}

impl AppConfig {
    /// Load configuration from the environment, reading a `.env` file if
    /// one is present.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_url =
            normalize_backend_url(&env::var("TEXFORGE_BACKEND_URL").unwrap_or_default());

        let output_dir = env::var("TEXFORGE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));

        let mut policy = PollPolicy::default();
        if let Ok(raw) = env::var("TEXFORGE_MAX_ATTEMPTS") {
            policy.max_attempts = raw
                .parse()
                .map_err(|_| anyhow::anyhow!("TEXFORGE_MAX_ATTEMPTS must be a number: {raw}"))?;
        }

        Ok(Self {
            backend_url,
            request_timeout: Duration::from_secs(15),
            list_timeout: Duration::from_secs(5),
            output_dir,
            policy,
        })
    }
}

/// Normalize a user-supplied backend URL: blank falls back to the local
/// default, a missing scheme gets `http://` prepended.
pub fn normalize_backend_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_BACKEND_URL.to_string();
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
