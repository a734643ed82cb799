//! Campaign attribution from UTM parameters and ad click identifiers.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query parameters captured from a landing URL.
pub const UTM_KEYS: [&str; 7] = [
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_content",
    "utm_term",
    "gclid",
    "fbclid",
];

/// UTM parameters plus platform click identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_term: Option<String>,
    /// Google Ads click ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gclid: Option<String>,
    /// Facebook Ads click ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbclid: Option<String>,
}

impl UtmParams {
    /// Extract parameters from a URL's query string.
    ///
    /// Unparseable URLs and empty values yield no parameters.
    pub fn from_url(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) => Self::from_pairs(url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned()))),
            Err(_) => Self::default(),
        }
    }

    fn from_pairs(pairs: impl Iterator<Item = (String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_str() {
                "utm_source" => &mut params.utm_source,
                "utm_medium" => &mut params.utm_medium,
                "utm_campaign" => &mut params.utm_campaign,
                "utm_content" => &mut params.utm_content,
                "utm_term" => &mut params.utm_term,
                "gclid" => &mut params.gclid,
                "fbclid" => &mut params.fbclid,
                _ => continue,
            };
            // First occurrence wins
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Iterate over present parameters as `(key, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let values = [
            &self.utm_source,
            &self.utm_medium,
            &self.utm_campaign,
            &self.utm_content,
            &self.utm_term,
            &self.gclid,
            &self.fbclid,
        ];
        UTM_KEYS
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    pub fn paid_channel(&self) -> Option<PaidChannel> {
        paid_channel(
            self.gclid.as_deref(),
            self.fbclid.as_deref(),
            self.utm_source.as_deref(),
            self.utm_medium.as_deref(),
        )
    }

    pub fn is_from_google_ads(&self) -> bool {
        is_google_ads(self.gclid.as_deref(), self.utm_source.as_deref(), self.utm_medium.as_deref())
    }

    pub fn is_from_facebook_ads(&self) -> bool {
        is_facebook_ads(self.fbclid.as_deref(), self.utm_source.as_deref(), self.utm_medium.as_deref())
    }

    pub fn campaign_info(&self) -> CampaignInfo {
        CampaignInfo {
            source: self.utm_source.clone().unwrap_or_else(|| DIRECT_SOURCE.into()),
            medium: self.utm_medium.clone().unwrap_or_else(|| NO_VALUE.into()),
            campaign: self.utm_campaign.clone().unwrap_or_else(|| NO_VALUE.into()),
            is_from_ads: self.paid_channel().is_some(),
        }
    }
}

/// Bucket for traffic without a UTM source.
pub const DIRECT_SOURCE: &str = "direct";

/// Bucket for traffic without a medium or campaign.
pub const NO_VALUE: &str = "none";

/// Summary of where a visitor came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignInfo {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    pub is_from_ads: bool,
}

/// Paid traffic channels recognised by the analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidChannel {
    GoogleAds,
    FacebookAds,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn matches(value: Option<&str>, expected: &str) -> bool {
    value == Some(expected)
}

/// Paid search: a Google click ID, or exactly `google` / `cpc`.
pub fn is_google_ads(gclid: Option<&str>, source: Option<&str>, medium: Option<&str>) -> bool {
    non_empty(gclid).is_some() || (matches(source, "google") && matches(medium, "cpc"))
}

/// Paid social: a Facebook click ID, or exactly `facebook` / `cpc`.
pub fn is_facebook_ads(fbclid: Option<&str>, source: Option<&str>, medium: Option<&str>) -> bool {
    non_empty(fbclid).is_some() || (matches(source, "facebook") && matches(medium, "cpc"))
}

/// Classify a visit; Google wins when both channels match.
pub fn paid_channel(
    gclid: Option<&str>,
    fbclid: Option<&str>,
    source: Option<&str>,
    medium: Option<&str>,
) -> Option<PaidChannel> {
    if is_google_ads(gclid, source, medium) {
        Some(PaidChannel::GoogleAds)
    } else if is_facebook_ads(fbclid, source, medium) {
        Some(PaidChannel::FacebookAds)
    } else {
        None
    }
}
