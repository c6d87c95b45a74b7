use serde::Deserialize;

/// Default CRM API base, overridable for tests.
pub const DEFAULT_HUBSPOT_BASE_URL: &str = "https://api.hubapi.com";
/// Default transactional-email API base, overridable for tests.
pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";
/// Public marketing-site URL, used to resolve asset links in email bodies.
pub const DEFAULT_SITE_BASE_URL: &str = "https://enfoque-web.vercel.app";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub hubspot_token: String,
    pub hubspot_base_url: String,
    pub hubspot_pipeline_id: String,
    pub hubspot_stage_id: String,
    /// Portal identifier, only used to build deep links in the internal email.
    pub hubspot_portal_id: Option<String>,
    /// Email settings are optional as a group: a missing value disables the
    /// affected send at dispatch time with a warning instead of failing startup.
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
    pub from_email: Option<String>,
    pub notify_email: Option<String>,
    pub reply_to_email: Option<String>,
    pub site_base_url: String,
    /// Number for the pre-filled wa.me reply link, digits only.
    pub whatsapp_number: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            hubspot_token: std::env::var("HUBSPOT_PRIVATE_APP_TOKEN")
                .map_err(|_| {
                    anyhow::anyhow!("HUBSPOT_PRIVATE_APP_TOKEN environment variable required")
                })
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("HUBSPOT_PRIVATE_APP_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            hubspot_base_url: std::env::var("HUBSPOT_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HUBSPOT_BASE_URL.to_string()),
            hubspot_pipeline_id: std::env::var("HUBSPOT_PIPELINE_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "default".to_string()),
            hubspot_stage_id: std::env::var("HUBSPOT_STAGE_ID")
                .map_err(|_| anyhow::anyhow!("HUBSPOT_STAGE_ID environment variable required"))
                .and_then(|stage| {
                    if stage.trim().is_empty() {
                        anyhow::bail!("HUBSPOT_STAGE_ID cannot be empty");
                    }
                    Ok(stage)
                })?,
            hubspot_portal_id: std::env::var("HUBSPOT_PORTAL_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            resend_api_key: std::env::var("RESEND_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            resend_base_url: std::env::var("RESEND_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RESEND_BASE_URL.to_string()),
            from_email: std::env::var("LEAD_FROM_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            notify_email: std::env::var("LEAD_NOTIFY_EMAIL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            reply_to_email: std::env::var("LEAD_REPLY_TO")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            site_base_url: std::env::var("SITE_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SITE_BASE_URL.to_string()),
            whatsapp_number: std::env::var("WHATSAPP_NUMBER")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("HubSpot base URL: {}", config.hubspot_base_url);
        tracing::debug!(
            "HubSpot pipeline/stage: {}/{}",
            config.hubspot_pipeline_id,
            config.hubspot_stage_id
        );
        if config.resend_api_key.is_none() {
            tracing::warn!("RESEND_API_KEY not set; email dispatch will be skipped with warnings");
        }
        tracing::debug!("Server port: {}", config.port);

        Ok(config)
    }
}
