//! Stylesheet origin classification.
//!
//! Labels where a sheet came from so the audit tool can group findings.
//! First matching bucket wins; the probes are data, not code, so a host
//! update means editing [`OriginRules`], not the classifier.

use crate::sheet::SheetMeta;

/// Provenance category of a rule's source stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Origin {
    /// Shipped by the platform itself (known CDN).
    PlatformCore,
    /// Installed theme.
    Theme,
    /// The user's own custom-CSS editor sheet.
    CustomOverride,
    /// A labeled plugin style element.
    Plugin,
    /// Third-party resource (webfonts); deliberately ambiguous between
    /// theme and plugin origin.
    External,
    /// Unlabeled platform-internal styles.
    Unknown,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::PlatformCore => "platform-core",
            Origin::Theme => "theme",
            Origin::CustomOverride => "custom-override",
            Origin::Plugin => "plugin",
            Origin::External => "external",
            Origin::Unknown => "unknown",
        }
    }
}

/// Classification result: the bucket plus a display name when one exists.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OriginInfo {
    pub origin: Origin,
    pub name: Option<String>,
}

/// Probe data the classifier runs against, ordered by precedence.
#[derive(Debug, Clone)]
pub struct OriginRules {
    /// URL substrings identifying the platform's own asset CDN.
    pub platform_hosts: Vec<String>,
    /// URL substrings identifying known theme-hosting domains.
    pub theme_hosts: Vec<String>,
    /// URL substrings identifying webfont hosts.
    pub font_hosts: Vec<String>,
    /// id of the custom-CSS editor's style element.
    pub custom_editor_id: String,
    /// Suffix theme loaders append to their container style element ids.
    pub theme_suffix: String,
}

impl Default for OriginRules {
    fn default() -> Self {
        Self {
            platform_hosts: vec![
                "discord.com/assets".into(),
                "cdn.discordapp.com".into(),
            ],
            theme_hosts: vec!["betterdiscord.app".into(), "raw.githack.com".into()],
            font_hosts: vec!["fonts.googleapis.com".into(), "fonts.gstatic.com".into()],
            custom_editor_id: "customcss".into(),
            theme_suffix: "-theme-container".into(),
        }
    }
}

/// Classify a sheet's origin, first match wins.
pub fn classify_origin(rules: &OriginRules, meta: &SheetMeta) -> OriginInfo {
    let url = meta.href.as_deref().unwrap_or("");

    if !url.is_empty() && rules.platform_hosts.iter().any(|host| url.contains(host)) {
        return OriginInfo {
            origin: Origin::PlatformCore,
            name: file_name(url),
        };
    }

    if meta.owner_id.as_deref() == Some(rules.custom_editor_id.as_str()) {
        return OriginInfo {
            origin: Origin::CustomOverride,
            name: meta.owner_id.clone(),
        };
    }

    if let Some(owner_id) = meta.owner_id.as_deref() {
        if let Some(theme_name) = owner_id.strip_suffix(rules.theme_suffix.as_str()) {
            if !theme_name.is_empty() {
                return OriginInfo {
                    origin: Origin::Theme,
                    name: Some(theme_name.to_string()),
                };
            }
        }
    }

    if !url.is_empty() && rules.theme_hosts.iter().any(|host| url.contains(host)) {
        return OriginInfo {
            origin: Origin::Theme,
            name: file_name(url),
        };
    }

    if !url.is_empty() && rules.font_hosts.iter().any(|host| url.contains(host)) {
        // Could have been pulled in by a theme or a plugin; the source does
        // not record which, so neither do we.
        return OriginInfo {
            origin: Origin::External,
            name: file_name(url),
        };
    }

    if let Some(label) = meta.owner_label.as_deref() {
        return OriginInfo {
            origin: Origin::Plugin,
            name: Some(label.to_string()),
        };
    }

    OriginInfo {
        origin: Origin::Unknown,
        name: None,
    }
}

/// Last path segment of a URL, without query string.
fn file_name(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
