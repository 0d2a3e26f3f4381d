//! Pure enrichment helpers applied to every incoming visit.

use std::fmt;

/// Placeholder stored whenever a derived field cannot be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Coarse device class derived from a `User-Agent` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Desktop,
    Laptop,
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Desktop => "Desktop",
            DeviceType::Laptop => "Laptop",
            DeviceType::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phone and tablet markers. Checked first: Android UAs also carry `Linux`.
const MOBILE_TOKENS: &[&str] = &[
    "Android",
    "iPhone",
    "iPad",
    "iPod",
    "Mobile",
    "BlackBerry",
    "Windows Phone",
    "Opera Mini",
    "IEMobile",
];

const DESKTOP_TOKENS: &[&str] = &["Macintosh", "Windows NT", "Linux"];

const LAPTOP_TOKENS: &[&str] = &["CrOS"];

/// Classify a user agent. First matching rule wins; empty or unrecognised
/// input yields [`DeviceType::Unknown`].
pub fn classify_device(user_agent: &str) -> DeviceType {
    let contains_any = |tokens: &[&str]| tokens.iter().any(|t| user_agent.contains(t));

    if user_agent.is_empty() {
        DeviceType::Unknown
    } else if contains_any(MOBILE_TOKENS) {
        DeviceType::Mobile
    } else if contains_any(DESKTOP_TOKENS) {
        DeviceType::Desktop
    } else if contains_any(LAPTOP_TOKENS) {
        DeviceType::Laptop
    } else {
        DeviceType::Unknown
    }
}

/// Extract the primary language from an `Accept-Language` header value.
///
/// `"en-US,en;q=0.9"` → `"en-US"`. Missing or blank headers yield `"Unknown"`.
pub fn extract_language(header: Option<&str>) -> String {
    header
        .and_then(|raw| raw.split(',').next())
        .and_then(|first| first.split(';').next())
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}
