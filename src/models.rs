use serde::{Deserialize, Serialize};

/// Raw, untrusted contact-form submission as posted by the marketing site.
///
/// Every field is optional at the wire level; `validate` decides which are
/// actually required. Field names match the Spanish form inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadSubmission {
    pub nombre: Option<String>,
    pub empresa: Option<String>,
    pub telefono_whatsapp: Option<String>,
    pub email: Option<String>,
    pub ciudad_estado: Option<String>,
    pub servicio: Option<String>,
    #[serde(rename = "tipoProyecto")]
    pub tipo_proyecto: Option<String>,
    pub mensaje: Option<String>,
    /// Honeypot field. Hidden on the real form; any non-empty value marks
    /// the submission as automated.
    pub website: Option<String>,
}

/// Trimmed, defaulted view of a submission. Derived once per request and
/// immutable afterwards.
///
/// Optional fields are `None` when empty after trimming; the `*_or_default`
/// accessors substitute the human-readable placeholders used in deal
/// descriptions and email bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLead {
    pub nombre: String,
    pub empresa: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub ciudad_estado: Option<String>,
    /// Resolved with precedence: explicit `servicio` > `tipoProyecto` >
    /// legacy `[Tipo de proyecto: X]` tag embedded in `mensaje`.
    pub servicio: Option<String>,
    /// Message body with the legacy tag stripped, when one was present.
    pub mensaje: Option<String>,
}

impl NormalizedLead {
    pub fn empresa_or_default(&self) -> &str {
        self.empresa.as_deref().unwrap_or("No proporcionado")
    }

    pub fn telefono_or_default(&self) -> &str {
        self.telefono.as_deref().unwrap_or("No proporcionado")
    }

    pub fn email_or_default(&self) -> &str {
        self.email.as_deref().unwrap_or("No proporcionado")
    }

    pub fn ciudad_estado_or_default(&self) -> &str {
        self.ciudad_estado.as_deref().unwrap_or("No proporcionado")
    }

    pub fn servicio_or_default(&self) -> &str {
        self.servicio.as_deref().unwrap_or("No especificado")
    }

    pub fn mensaje_or_default(&self) -> &str {
        self.mensaje.as_deref().unwrap_or("Sin mensaje")
    }
}

/// CRM identifiers returned to the caller on success.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadData {
    pub contact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    pub deal_id: String,
}

/// Outcome of the two independent email send attempts.
///
/// Accumulated per channel; failures here never fail the request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailOutcome {
    pub internal_sent: bool,
    pub user_sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl EmailOutcome {
    pub fn none() -> Self {
        Self {
            internal_sent: false,
            user_sent: false,
            warning: None,
        }
    }
}

/// Success response body for `POST /api/lead`.
#[derive(Debug, Clone, Serialize)]
pub struct LeadResponse {
    pub ok: bool,
    pub message: String,
    pub data: LeadData,
    pub email: EmailOutcome,
}

/// One hit inside a HubSpot search response.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub id: String,
}

/// Response shape of `POST /crm/v3/objects/{type}/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ObjectRef>,
}

/// Response shape of object create calls.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectResponse {
    pub id: String,
}

/// Response shape of the email provider's send endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub id: Option<String>,
}
