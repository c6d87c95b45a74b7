//! Normalization and validation of raw contact-form submissions.
//!
//! Validation is the only gate that rejects; normalization never fails and is
//! applied after it. Both are pure functions over the posted payload.

use crate::errors::AppError;
use crate::models::{LeadSubmission, NormalizedLead};
use regex::Regex;
use serde_json::Value;

/// Extracts a string field from the raw payload, trimmed. Non-string values
/// behave like an absent field.
fn text(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Simple `local@domain.tld` shape check. Deliberately loose: the business
/// process tolerates odd-but-deliverable addresses.
pub fn is_valid_email(email: &str) -> bool {
    let email_regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
    email_regex.is_match(email)
}

/// A value "looks like" a phone number when it carries at least 7 digits,
/// whatever formatting characters surround them.
pub fn is_likely_phone(value: &str) -> bool {
    value.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

/// Validates the raw request payload and produces a trimmed [`LeadSubmission`].
///
/// Only `nombre` is hard-required; `telefono_whatsapp` and `email` are
/// format-checked when present. Error messages are user-facing and safe to
/// return verbatim.
pub fn validate(raw: &Value) -> Result<LeadSubmission, AppError> {
    if !raw.is_object() {
        return Err(AppError::Validation(
            "Payload inválido. Se esperaba un objeto JSON.".to_string(),
        ));
    }

    let submission = LeadSubmission {
        nombre: text(raw, "nombre"),
        empresa: text(raw, "empresa"),
        telefono_whatsapp: text(raw, "telefono_whatsapp"),
        email: text(raw, "email"),
        ciudad_estado: text(raw, "ciudad_estado"),
        servicio: text(raw, "servicio"),
        tipo_proyecto: text(raw, "tipoProyecto"),
        mensaje: text(raw, "mensaje"),
        website: text(raw, "website"),
    };

    if submission.nombre.is_none() {
        return Err(AppError::Validation(
            "El campo 'nombre' es obligatorio.".to_string(),
        ));
    }

    if let Some(ref phone) = submission.telefono_whatsapp {
        if !is_likely_phone(phone) {
            return Err(AppError::Validation(
                "El campo 'telefono_whatsapp' no parece válido.".to_string(),
            ));
        }
    }

    if let Some(ref email) = submission.email {
        if !is_valid_email(email) {
            return Err(AppError::Validation(
                "El campo 'email' no tiene un formato válido.".to_string(),
            ));
        }
    }

    Ok(submission)
}

/// Resolves the requested service with precedence:
/// explicit `servicio` > `tipoProyecto` > legacy `[Tipo de proyecto: X]` tag
/// embedded at the start of `mensaje` (stripped from the body when matched).
fn resolve_servicio(submission: &LeadSubmission) -> (Option<String>, Option<String>) {
    let mensaje = submission.mensaje.clone();

    if submission.servicio.is_some() {
        return (submission.servicio.clone(), mensaje);
    }
    if submission.tipo_proyecto.is_some() {
        return (submission.tipo_proyecto.clone(), mensaje);
    }

    // Migration-era fallback: older form versions prepended the project type
    // to the free-text message instead of posting a dedicated field.
    if let Some(ref body) = mensaje {
        let tag_regex = Regex::new(r"^\s*\[Tipo de proyecto:\s*([^\]]+)\]\s*").unwrap();
        if let Some(captures) = tag_regex.captures(body) {
            let servicio = captures
                .get(1)
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty());
            let stripped = tag_regex.replace(body, "").trim().to_string();
            let remaining = if stripped.is_empty() {
                None
            } else {
                Some(stripped)
            };
            return (servicio, remaining);
        }
    }

    (None, mensaje)
}

/// Derives the immutable [`NormalizedLead`] from a validated submission.
/// Pure and infallible; rejection is `validate`'s job.
pub fn normalize(submission: &LeadSubmission) -> NormalizedLead {
    let (servicio, mensaje) = resolve_servicio(submission);

    NormalizedLead {
        nombre: submission
            .nombre
            .clone()
            .unwrap_or_else(|| "Sin nombre".to_string()),
        empresa: submission.empresa.clone(),
        telefono: submission.telefono_whatsapp.clone(),
        email: submission.email.clone(),
        ciudad_estado: submission.ciudad_estado.clone(),
        servicio,
        mensaje,
    }
}

/// Splits a full name into HubSpot's firstname/lastname pair: first
/// whitespace token, then the remaining tokens joined by single spaces.
pub fn split_name(full_name: &str) -> (String, Option<String>) {
    let mut tokens = full_name.split_whitespace();
    let firstname = tokens.next().unwrap_or("").to_string();
    let rest: Vec<&str> = tokens.collect();
    let lastname = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };
    (firstname, lastname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_rejects_non_object() {
        assert!(validate(&json!("hola")).is_err());
        assert!(validate(&json!([1, 2])).is_err());
        assert!(validate(&json!(null)).is_err());
    }

    #[test]
    fn validate_requires_nombre() {
        let err = validate(&json!({"mensaje": "Hola"})).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("nombre")),
            other => panic!("unexpected error: {:?}", other),
        }

        // Whitespace-only counts as missing.
        assert!(validate(&json!({"nombre": "   "})).is_err());
    }

    #[test]
    fn validate_checks_phone_shape_only_when_present() {
        assert!(validate(&json!({"nombre": "Ana"})).is_ok());
        assert!(validate(&json!({"nombre": "Ana", "telefono_whatsapp": "123"})).is_err());
        assert!(validate(&json!({"nombre": "Ana", "telefono_whatsapp": "55 1234 5678"})).is_ok());
    }

    #[test]
    fn validate_checks_email_shape_only_when_present() {
        assert!(validate(&json!({"nombre": "Ana"})).is_ok());
        assert!(validate(&json!({"nombre": "Ana", "email": "not-an-email"})).is_err());
        assert!(validate(&json!({"nombre": "Ana", "email": "ana@acme"})).is_err());
        assert!(validate(&json!({"nombre": "Ana", "email": "ana@acme.mx"})).is_ok());
    }

    #[test]
    fn validate_trims_all_fields() {
        let submission =
            validate(&json!({"nombre": "  Ana Díaz  ", "empresa": "  Acme  "})).unwrap();
        assert_eq!(submission.nombre.as_deref(), Some("Ana Díaz"));
        assert_eq!(submission.empresa.as_deref(), Some("Acme"));
    }

    #[test]
    fn normalize_prefers_explicit_servicio() {
        let submission = validate(&json!({
            "nombre": "Ana",
            "servicio": "Stands",
            "tipoProyecto": "Letreros",
            "mensaje": "[Tipo de proyecto: Lonas]\nHola"
        }))
        .unwrap();
        let lead = normalize(&submission);
        assert_eq!(lead.servicio.as_deref(), Some("Stands"));
        // Tag stays in the message when an explicit field won.
        assert!(lead.mensaje.as_deref().unwrap().contains("Lonas"));
    }

    #[test]
    fn normalize_falls_back_to_tipo_proyecto() {
        let submission = validate(&json!({
            "nombre": "Ana",
            "tipoProyecto": "Letreros"
        }))
        .unwrap();
        let lead = normalize(&submission);
        assert_eq!(lead.servicio.as_deref(), Some("Letreros"));
    }

    #[test]
    fn normalize_extracts_legacy_tag_from_mensaje() {
        let submission = validate(&json!({
            "nombre": "Ana",
            "mensaje": "[Tipo de proyecto: Stands]\nHola"
        }))
        .unwrap();
        let lead = normalize(&submission);
        assert_eq!(lead.servicio.as_deref(), Some("Stands"));
        assert_eq!(lead.mensaje.as_deref(), Some("Hola"));
    }

    #[test]
    fn normalize_handles_tag_only_mensaje() {
        let submission = validate(&json!({
            "nombre": "Ana",
            "mensaje": "[Tipo de proyecto: Stands]"
        }))
        .unwrap();
        let lead = normalize(&submission);
        assert_eq!(lead.servicio.as_deref(), Some("Stands"));
        assert_eq!(lead.mensaje, None);
        assert_eq!(lead.mensaje_or_default(), "Sin mensaje");
    }

    #[test]
    fn normalize_defaults_missing_fields_to_placeholders() {
        let submission = validate(&json!({"nombre": "Ana"})).unwrap();
        let lead = normalize(&submission);
        assert_eq!(lead.empresa_or_default(), "No proporcionado");
        assert_eq!(lead.servicio_or_default(), "No especificado");
        assert_eq!(lead.mensaje_or_default(), "Sin mensaje");
    }

    #[test]
    fn split_name_single_token() {
        assert_eq!(split_name("Ana"), ("Ana".to_string(), None));
    }

    #[test]
    fn split_name_multiple_tokens() {
        assert_eq!(
            split_name("Ana Díaz"),
            ("Ana".to_string(), Some("Díaz".to_string()))
        );
        assert_eq!(
            split_name("  Ana   María   Díaz  "),
            ("Ana".to_string(), Some("María Díaz".to_string()))
        );
    }
}
