//! Outbound lead payload formatting.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use studio_core::{FormSubmission, UtmParams};

/// Byte-order mark prepended to string fields when enabled.
pub const BOM: char = '\u{FEFF}';

/// Lead as sent to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadPayload {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    /// `DD/MM/YYYY`, never prefixed
    pub birth_date: String,
    pub experience_level: String,
    pub experience_label: String,
    pub submitted_at: String,
    #[serde(flatten)]
    pub attribution: UtmParams,
}

fn prefixed(value: impl AsRef<str>, bom: bool) -> String {
    if bom {
        format!("{}{}", BOM, value.as_ref())
    } else {
        value.as_ref().to_string()
    }
}

impl LeadPayload {
    /// Format a validated lead for delivery.
    pub fn format(
        lead: &FormSubmission,
        attribution: &UtmParams,
        submitted_at: DateTime<Utc>,
        bom: bool,
    ) -> Self {
        let attribution = UtmParams {
            utm_source: attribution.utm_source.as_ref().map(|v| prefixed(v, bom)),
            utm_medium: attribution.utm_medium.as_ref().map(|v| prefixed(v, bom)),
            utm_campaign: attribution.utm_campaign.as_ref().map(|v| prefixed(v, bom)),
            utm_content: attribution.utm_content.as_ref().map(|v| prefixed(v, bom)),
            utm_term: attribution.utm_term.as_ref().map(|v| prefixed(v, bom)),
            gclid: attribution.gclid.as_ref().map(|v| prefixed(v, bom)),
            fbclid: attribution.fbclid.as_ref().map(|v| prefixed(v, bom)),
        };

        Self {
            full_name: prefixed(lead.full_name.trim(), bom),
            email: prefixed(lead.email.trim().to_lowercase(), bom),
            phone: prefixed(&lead.phone, bom),
            birth_date: lead.birth_date.format("%d/%m/%Y").to_string(),
            experience_level: prefixed(lead.experience_level.as_str(), bom),
            experience_label: prefixed(lead.experience_level.label(), bom),
            submitted_at: prefixed(submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true), bom),
            attribution,
        }
    }

    /// Flat `(name, value)` pairs for form-encoded transports.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("full_name", self.full_name.clone()),
            ("email", self.email.clone()),
            ("phone", self.phone.clone()),
            ("birth_date", self.birth_date.clone()),
            ("experience_level", self.experience_level.clone()),
            ("experience_label", self.experience_label.clone()),
            ("submitted_at", self.submitted_at.clone()),
        ];
        fields.extend(self.attribution.iter().map(|(k, v)| (k, v.to_string())));
        fields
    }
}
