/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use lead_capture_api::compose::escape_html;
use lead_capture_api::lead::{is_likely_phone, is_valid_email, normalize, split_name, validate};
use proptest::prelude::*;
use serde_json::json;

// Property: validation and normalization never panic
proptest! {
    #[test]
    fn validate_never_panics(nombre in "\\PC*", mensaje in "\\PC*", website in "\\PC*") {
        let _ = validate(&json!({
            "nombre": nombre,
            "mensaje": mensaje,
            "website": website,
        }));
    }

    #[test]
    fn normalize_never_panics_and_placeholders_are_non_empty(
        nombre in "[a-zA-Záéíóú ]{1,40}",
        mensaje in "\\PC*"
    ) {
        prop_assume!(!nombre.trim().is_empty());
        let submission = validate(&json!({"nombre": nombre, "mensaje": mensaje})).unwrap();
        let lead = normalize(&submission);
        prop_assert!(!lead.nombre.is_empty());
        prop_assert!(!lead.empresa_or_default().is_empty());
        prop_assert!(!lead.servicio_or_default().is_empty());
        prop_assert!(!lead.mensaje_or_default().is_empty());
    }
}

// Property: name splitting preserves tokens
proptest! {
    #[test]
    fn split_name_first_token_has_no_whitespace(name in "\\PC*") {
        let (firstname, _) = split_name(&name);
        prop_assert!(!firstname.contains(char::is_whitespace));
    }

    #[test]
    fn split_name_rejoins_to_original_tokens(name in "[a-zA-Z]{1,10}( [a-zA-Z]{1,10}){0,4}") {
        let (firstname, lastname) = split_name(&name);
        let rejoined = match lastname {
            Some(last) => format!("{} {}", firstname, last),
            None => firstname,
        };
        prop_assert_eq!(rejoined, name);
    }
}

// Property: validators agree with their definitions
proptest! {
    #[test]
    fn phone_check_counts_digits(phone in "\\PC*") {
        let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
        prop_assert_eq!(is_likely_phone(&phone), digits >= 7);
    }

    #[test]
    fn email_check_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }

    #[test]
    fn simple_emails_are_accepted(
        local in "[a-z0-9.]{1,12}",
        domain in "[a-z0-9]{1,12}",
        tld in "[a-z]{2,6}"
    ) {
        let email = format!("{}@{}.{}", local, domain, tld);
        prop_assert!(is_valid_email(&email));
    }
}

// Property: HTML escaping leaves no active markup characters
proptest! {
    #[test]
    fn escaped_html_has_no_raw_markup(value in "\\PC*") {
        let escaped = escape_html(&value);
        prop_assert!(!escaped.contains('<'));
        prop_assert!(!escaped.contains('>'));
        prop_assert!(!escaped.contains('"'));
    }

    #[test]
    fn escaping_preserves_plain_text(value in "[a-zA-Z0-9 ]*") {
        prop_assert_eq!(escape_html(&value), value);
    }
}
