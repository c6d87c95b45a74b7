//! Deal naming and email body composition.
//!
//! Everything here is pure string building over a [`NormalizedLead`] plus the
//! CRM identifiers produced earlier in the request. Attacker-controlled
//! values are HTML-escaped in the HTML variants.

use crate::config::Config;
use crate::lead::split_name;
use crate::models::NormalizedLead;
use chrono::Local;
use url::Url;

/// Upper bound on the pre-filled WhatsApp greeting, in characters.
const WHATSAPP_TEXT_MAX_CHARS: usize = 300;

/// Composed subject and bodies for one outgoing email.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Escapes a value for interpolation into HTML markup.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Resolves a possibly-relative asset path against the public site URL.
pub fn to_absolute_url(value: &str, site: &str) -> String {
    if value.is_empty() {
        return site.to_string();
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        return value.to_string();
    }

    let site = site.strip_suffix('/').unwrap_or(site);
    if value.starts_with('/') {
        format!("{}{}", site, value)
    } else {
        format!("{}/{}", site, value)
    }
}

/// Deterministic deal name:
/// `Web Lead | {servicio?} | {empresa?} | {nombre} | {ciudad?} | {timestamp}`,
/// empty segments omitted, timestamp in local `YYYY-MM-DD HH:MM`.
pub fn deal_name(lead: &NormalizedLead) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M").to_string();

    let mut segments = vec!["Web Lead".to_string()];
    if let Some(ref servicio) = lead.servicio {
        segments.push(servicio.clone());
    }
    if let Some(ref empresa) = lead.empresa {
        segments.push(empresa.clone());
    }
    segments.push(lead.nombre.clone());
    if let Some(ref ciudad) = lead.ciudad_estado {
        segments.push(ciudad.clone());
    }
    segments.push(timestamp);

    segments.join(" | ")
}

/// Deal description: every normalized field plus pipeline/stage, one per line.
pub fn deal_description(lead: &NormalizedLead, pipeline: &str, stage: &str) -> String {
    [
        format!("Nombre: {}", lead.nombre),
        format!("Empresa: {}", lead.empresa_or_default()),
        format!("Teléfono/WhatsApp: {}", lead.telefono_or_default()),
        format!("Email: {}", lead.email_or_default()),
        format!("Ciudad/Estado: {}", lead.ciudad_estado_or_default()),
        format!("Servicio: {}", lead.servicio_or_default()),
        format!("Mensaje: {}", lead.mensaje_or_default()),
        format!("Pipeline: {}", pipeline),
        format!("Etapa: {}", stage),
    ]
    .join("\n")
}

/// Deep link to the deal record when a portal id is configured, else the raw
/// deal id so the internal email still identifies the record.
pub fn crm_record_url(portal_id: Option<&str>, deal_id: &str) -> String {
    match portal_id {
        Some(portal) => format!(
            "https://app.hubspot.com/contacts/{}/record/0-3/{}",
            portal, deal_id
        ),
        None => deal_id.to_string(),
    }
}

/// Builds the pre-filled `wa.me` reply link, truncating the greeting to
/// [`WHATSAPP_TEXT_MAX_CHARS`] characters before percent-encoding it.
///
/// Returns `None` when no WhatsApp number is configured.
pub fn whatsapp_link(number: Option<&str>, greeting: &str) -> Option<String> {
    let digits: String = number?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }

    let truncated: String = greeting.chars().take(WHATSAPP_TEXT_MAX_CHARS).collect();
    Url::parse_with_params(&format!("https://wa.me/{}", digits), &[("text", truncated)])
        .map(|url| url.to_string())
        .ok()
}

/// Greeting template used for the pre-filled reply link in both emails.
fn whatsapp_greeting(lead: &NormalizedLead) -> String {
    format!(
        "Hola {}, recibimos tu solicitud sobre {}. ¿Seguimos por aquí?",
        lead.nombre,
        lead.servicio_or_default()
    )
}

/// Internal sales alert: every normalized field, the CRM identifiers, a deep
/// link to the deal record, and a one-click WhatsApp reply link.
pub fn internal_email(
    lead: &NormalizedLead,
    contact_id: &str,
    company_id: Option<&str>,
    deal_id: &str,
    config: &Config,
) -> EmailContent {
    let subject = format!("Nuevo lead web: {}", lead.nombre);
    let record_url = crm_record_url(config.hubspot_portal_id.as_deref(), deal_id);
    let wa_link = whatsapp_link(config.whatsapp_number.as_deref(), &whatsapp_greeting(lead));

    let fields = [
        ("Nombre", lead.nombre.as_str()),
        ("Empresa", lead.empresa_or_default()),
        ("Teléfono/WhatsApp", lead.telefono_or_default()),
        ("Email", lead.email_or_default()),
        ("Ciudad/Estado", lead.ciudad_estado_or_default()),
        ("Servicio", lead.servicio_or_default()),
        ("Mensaje", lead.mensaje_or_default()),
    ];

    let mut html = String::from("<h2>Nuevo lead desde el sitio web</h2><ul>");
    for (label, value) in &fields {
        html.push_str(&format!(
            "<li><strong>{}:</strong> {}</li>",
            label,
            escape_html(value)
        ));
    }
    html.push_str("</ul><p>");
    html.push_str(&format!(
        "Contacto: {} · Deal: {}",
        escape_html(contact_id),
        escape_html(deal_id)
    ));
    if let Some(company) = company_id {
        html.push_str(&format!(" · Empresa: {}", escape_html(company)));
    }
    html.push_str("</p>");
    html.push_str(&format!(
        "<p><a href=\"{}\">Ver deal en el CRM</a></p>",
        escape_html(&record_url)
    ));
    if let Some(ref link) = wa_link {
        html.push_str(&format!(
            "<p><a href=\"{}\">Responder por WhatsApp</a></p>",
            escape_html(link)
        ));
    }

    let mut text = String::from("Nuevo lead desde el sitio web\n\n");
    for (label, value) in &fields {
        text.push_str(&format!("{}: {}\n", label, value));
    }
    text.push_str(&format!("\nContacto: {}\nDeal: {}\n", contact_id, deal_id));
    if let Some(company) = company_id {
        text.push_str(&format!("Empresa (CRM): {}\n", company));
    }
    text.push_str(&format!("CRM: {}\n", record_url));
    if let Some(ref link) = wa_link {
        text.push_str(&format!("WhatsApp: {}\n", link));
    }

    EmailContent {
        subject,
        html,
        text,
    }
}

/// User confirmation: greets by first name, restates the submitted summary,
/// offers the WhatsApp link and closes with the static privacy notice.
pub fn confirmation_email(lead: &NormalizedLead, config: &Config) -> EmailContent {
    let (first_name, _) = split_name(&lead.nombre);
    let subject = "Hemos recibido tu solicitud".to_string();
    let wa_link = whatsapp_link(config.whatsapp_number.as_deref(), &whatsapp_greeting(lead));
    let logo_url = to_absolute_url("/images/og-default.png", &config.site_base_url);

    let privacy_notice = "Tus datos se usan únicamente para dar seguimiento a tu \
         solicitud y no se comparten con terceros.";

    let mut html = format!(
        "<img src=\"{}\" alt=\"\" width=\"120\" />\
         <h2>Hola {}</h2>\
         <p>Gracias por escribirnos. Recibimos tu solicitud y te contactaremos \
         en breve.</p><ul>",
        escape_html(&logo_url),
        escape_html(&first_name)
    );
    html.push_str(&format!(
        "<li><strong>Servicio:</strong> {}</li>",
        escape_html(lead.servicio_or_default())
    ));
    html.push_str(&format!(
        "<li><strong>Mensaje:</strong> {}</li>",
        escape_html(lead.mensaje_or_default())
    ));
    html.push_str("</ul>");
    if let Some(ref link) = wa_link {
        html.push_str(&format!(
            "<p>¿Prefieres WhatsApp? <a href=\"{}\">Escríbenos aquí</a>.</p>",
            escape_html(link)
        ));
    }
    html.push_str(&format!("<p><small>{}</small></p>", privacy_notice));

    let mut text = format!(
        "Hola {}\n\nGracias por escribirnos. Recibimos tu solicitud y te \
         contactaremos en breve.\n\nServicio: {}\nMensaje: {}\n",
        first_name,
        lead.servicio_or_default(),
        lead.mensaje_or_default()
    );
    if let Some(ref link) = wa_link {
        text.push_str(&format!("\nWhatsApp: {}\n", link));
    }
    text.push_str(&format!("\n{}\n", privacy_notice));

    EmailContent {
        subject,
        html,
        text,
    }
}
