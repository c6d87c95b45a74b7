//! Transactional-email dispatch with idempotency keys.
//!
//! Sends go through the provider's REST API (Resend-style `/emails` endpoint)
//! with an `Idempotency-Key` header so a retried HTTP request cannot produce
//! duplicate emails. Missing email configuration fails before any network
//! call; the orchestrator downgrades either failure to a warning.

use crate::errors::AppError;
use crate::models::{NormalizedLead, SendResponse};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Which of the two per-lead emails a key or send belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Sales alert to the internal notification address.
    Internal,
    /// Confirmation back to the submitter.
    User,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Internal => "internal",
            EmailKind::User => "user",
        }
    }
}

/// One composed, addressed email ready for dispatch.
#[derive(Debug, Clone)]
pub struct SendEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub idempotency_key: Option<String>,
}

/// Derives the idempotency key for one email of a lead.
///
/// With a known deal id the key is deterministic per deal and kind, enabling
/// safe whole-request retries. Without one, the lead signature is hashed
/// together with the current UTC minute, bounding duplicates to one per
/// distinct signature per minute.
pub fn idempotency_key(
    kind: EmailKind,
    deal_id: Option<&str>,
    lead: &NormalizedLead,
) -> String {
    idempotency_key_at(kind, deal_id, lead, Utc::now())
}

fn idempotency_key_at(
    kind: EmailKind,
    deal_id: Option<&str>,
    lead: &NormalizedLead,
    now: DateTime<Utc>,
) -> String {
    if let Some(deal_id) = deal_id {
        return format!("lead-{}-{}", kind.as_str(), deal_id);
    }

    let minute_bucket = now.format("%Y-%m-%dT%H:%M").to_string();
    let signature = format!(
        "{}|{}|{}|{}",
        lead.nombre,
        lead.email.as_deref().unwrap_or(""),
        lead.telefono.as_deref().unwrap_or(""),
        minute_bucket
    );
    let digest = hex::encode(Sha256::digest(signature.as_bytes()));
    format!("lead-{}-{}", kind.as_str(), &digest[..40])
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl Mailer {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to create email client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Sends one email through the provider.
    ///
    /// Fails with [`AppError::Configuration`] before any network call when
    /// the API key, sender, or recipient is missing; non-2xx provider
    /// responses surface as [`AppError::Upstream`].
    pub async fn send(&self, email: &SendEmail) -> Result<(), AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::Configuration("RESEND_API_KEY no está configurada.".to_string())
            })?;
        if email.from.trim().is_empty() {
            return Err(AppError::Configuration(
                "Falta la dirección de remitente.".to_string(),
            ));
        }
        if email.to.trim().is_empty() {
            return Err(AppError::Configuration(
                "Falta la dirección de destinatario.".to_string(),
            ));
        }

        let mut body = json!({
            "from": email.from,
            "to": [email.to],
            "subject": email.subject,
            "html": email.html,
            "text": email.text,
        });
        if let Some(ref reply_to) = email.reply_to {
            body["reply_to"] = json!(reply_to);
        }

        let mut request = self
            .client
            .post(format!("{}/emails", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body);
        if let Some(ref key) = email.idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Email request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail: serde_json::Value = response.json().await.unwrap_or_else(|_| json!({}));
            let message = detail
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Email request failed ({})", status.as_u16()));
            return Err(AppError::Upstream(message));
        }

        let sent: SendResponse = response.json().await.unwrap_or_default();
        match sent.id {
            Some(id) => tracing::info!("Email sent to {} (id {})", email.to, id),
            None => tracing::info!("Email sent to {}", email.to),
        }
        Ok(())
    }
}
