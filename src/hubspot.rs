//! Client for the HubSpot CRM object API.
//!
//! Four primitives back the lead pipeline: property search, contact upsert,
//! company upsert and deal creation, plus the idempotent default-association
//! call. Every call is a single bearer-authenticated round-trip with no
//! retries; any non-2xx aborts the whole request upstream.

use crate::compose;
use crate::errors::AppError;
use crate::lead::split_name;
use crate::models::{NormalizedLead, ObjectResponse, SearchResponse};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Clone)]
pub struct HubSpotClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HubSpotClient {
    /// Creates a new client with a bounded per-call timeout.
    pub fn new(base_url: String, token: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::Upstream(format!("Failed to create HubSpot client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Sends one authenticated request and decodes the body, mapping non-2xx
    /// responses to [`AppError::Upstream`] with the provider message when one
    /// is available.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("HubSpot request failed: {}", e)))?;

        let status = response.status();
        let data: Value = response.json().await.unwrap_or_else(|_| json!({}));

        if !status.is_success() {
            let message = data
                .get("message")
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("HubSpot request failed ({})", status.as_u16()));
            return Err(AppError::Upstream(message));
        }

        Ok(data)
    }

    /// Searches one object type by an exact property match, limited to a
    /// single result. Returns the matching object id, if any.
    pub async fn search_by_property(
        &self,
        object_type: &str,
        property_name: &str,
        value: &str,
    ) -> Result<Option<String>, AppError> {
        let body = json!({
            "filterGroups": [
                {
                    "filters": [
                        {"propertyName": property_name, "operator": "EQ", "value": value}
                    ]
                }
            ],
            "limit": 1,
        });

        let data = self
            .request(
                Method::POST,
                &format!("/crm/v3/objects/{}/search", object_type),
                Some(body),
            )
            .await?;

        let response: SearchResponse = serde_json::from_value(data).unwrap_or_default();
        Ok(response.results.into_iter().next().map(|r| r.id))
    }

    /// Finds or creates the contact for a lead and returns its id.
    ///
    /// Matching prefers email over phone; when a match exists its properties
    /// are patched, otherwise a contact is created with the same properties.
    pub async fn upsert_contact(&self, lead: &NormalizedLead) -> Result<String, AppError> {
        let mut contact_id = None;
        if let Some(ref email) = lead.email {
            contact_id = self.search_by_property("contacts", "email", email).await?;
        } else if let Some(ref phone) = lead.telefono {
            contact_id = self.search_by_property("contacts", "phone", phone).await?;
        }

        let (firstname, lastname) = split_name(&lead.nombre);
        let mut properties = serde_json::Map::new();
        properties.insert("firstname".to_string(), json!(firstname));
        if let Some(lastname) = lastname {
            properties.insert("lastname".to_string(), json!(lastname));
        }
        if let Some(ref phone) = lead.telefono {
            properties.insert("phone".to_string(), json!(phone));
        }
        if let Some(ref email) = lead.email {
            properties.insert("email".to_string(), json!(email));
        }
        let body = json!({ "properties": properties });

        if let Some(id) = contact_id {
            self.request(
                Method::PATCH,
                &format!("/crm/v3/objects/contacts/{}", id),
                Some(body),
            )
            .await?;
            tracing::info!("Contact {} updated", id);
            return Ok(id);
        }

        let data = self
            .request(Method::POST, "/crm/v3/objects/contacts", Some(body))
            .await?;
        let created: ObjectResponse = serde_json::from_value(data).map_err(|e| {
            AppError::Upstream(format!("Failed to parse contact creation response: {}", e))
        })?;
        tracing::info!("Contact {} created", created.id);
        Ok(created.id)
    }

    /// Finds or creates a company by exact name. No-op for an absent name.
    pub async fn upsert_company(&self, name: Option<&str>) -> Result<Option<String>, AppError> {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => return Ok(None),
        };

        if let Some(id) = self.search_by_property("companies", "name", name).await? {
            return Ok(Some(id));
        }

        let body = json!({ "properties": { "name": name } });
        let data = self
            .request(Method::POST, "/crm/v3/objects/companies", Some(body))
            .await?;
        let created: ObjectResponse = serde_json::from_value(data).map_err(|e| {
            AppError::Upstream(format!("Failed to parse company creation response: {}", e))
        })?;
        tracing::info!("Company {} created", created.id);
        Ok(Some(created.id))
    }

    /// Creates the deal for a lead with its deterministic name and full
    /// description, returning the new deal id.
    pub async fn create_deal(
        &self,
        lead: &NormalizedLead,
        pipeline: &str,
        stage: &str,
    ) -> Result<String, AppError> {
        let body = json!({
            "properties": {
                "dealname": compose::deal_name(lead),
                "pipeline": pipeline,
                "dealstage": stage,
                "description": compose::deal_description(lead, pipeline, stage),
            }
        });

        let data = self
            .request(Method::POST, "/crm/v3/objects/deals", Some(body))
            .await?;
        let created: ObjectResponse = serde_json::from_value(data).map_err(|e| {
            AppError::Upstream(format!("Failed to parse deal creation response: {}", e))
        })?;
        tracing::info!("Deal {} created", created.id);
        Ok(created.id)
    }

    /// Sets the default association between two objects. Safe to repeat with
    /// the same arguments.
    pub async fn associate(
        &self,
        from_type: &str,
        from_id: &str,
        to_type: &str,
        to_id: &str,
    ) -> Result<(), AppError> {
        self.request(
            Method::PUT,
            &format!(
                "/crm/v4/objects/{}/{}/associations/default/{}/{}",
                from_type, from_id, to_type, to_id
            ),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HubSpotClient::new("https://example.com".to_string(), "token".to_string());
        assert!(client.is_ok());
    }
}
