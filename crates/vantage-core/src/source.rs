//! Acquisition channel classification.
//!
//! [`UserSource`] is the closed set of channels a user can be attributed to.
//! It round-trips to a lowercase string identifier; unrecognized strings
//! parse as [`UserSource::Unknown`] rather than failing, because an
//! unrecognized network is a resolution ambiguity, not an error.

use serde::{Deserialize, Serialize};

/// Closed enumeration of acquisition channels.
///
/// `Google` covers store-redirect traffic; the name is kept for
/// compatibility with historical analytics tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSource {
    Organic,
    Asa,
    Facebook,
    Google,
    GoogleGdn,
    GoogleDemgen,
    GoogleYoutube,
    GooglePmax,
    Ipat,
    TestPremium,
    Tiktok,
    Instagram,
    Snapchat,
    Bing,
    Moloco,
    Applovin,
    TiktokFullAccess,
    #[serde(other)]
    Unknown,
}

impl UserSource {
    /// All channels, in the order used for per-channel paywall reporting.
    pub const ALL: [UserSource; 18] = [
        UserSource::Organic,
        UserSource::Asa,
        UserSource::Facebook,
        UserSource::Google,
        UserSource::GoogleGdn,
        UserSource::GoogleDemgen,
        UserSource::GoogleYoutube,
        UserSource::GooglePmax,
        UserSource::Ipat,
        UserSource::TestPremium,
        UserSource::Tiktok,
        UserSource::Instagram,
        UserSource::Snapchat,
        UserSource::Bing,
        UserSource::Moloco,
        UserSource::Applovin,
        UserSource::TiktokFullAccess,
        UserSource::Unknown,
    ];

    /// Parse a lowercase channel identifier, case-insensitively.
    ///
    /// Unrecognized identifiers map to [`UserSource::Unknown`].
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "organic" => Self::Organic,
            "asa" => Self::Asa,
            "facebook" => Self::Facebook,
            "google" => Self::Google,
            "google_gdn" => Self::GoogleGdn,
            "google_demgen" => Self::GoogleDemgen,
            "google_youtube" => Self::GoogleYoutube,
            "google_pmax" => Self::GooglePmax,
            "ipat" => Self::Ipat,
            "test_premium" => Self::TestPremium,
            "tiktok" => Self::Tiktok,
            "instagram" => Self::Instagram,
            "snapchat" => Self::Snapchat,
            "bing" => Self::Bing,
            "moloco" => Self::Moloco,
            "applovin" => Self::Applovin,
            "tiktok_full_access" => Self::TiktokFullAccess,
            _ => Self::Unknown,
        }
    }

    /// Canonical lowercase identifier for this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organic => "organic",
            Self::Asa => "asa",
            Self::Facebook => "facebook",
            Self::Google => "google",
            Self::GoogleGdn => "google_gdn",
            Self::GoogleDemgen => "google_demgen",
            Self::GoogleYoutube => "google_youtube",
            Self::GooglePmax => "google_pmax",
            Self::Ipat => "ipat",
            Self::TestPremium => "test_premium",
            Self::Tiktok => "tiktok",
            Self::Instagram => "instagram",
            Self::Snapchat => "snapchat",
            Self::Bing => "bing",
            Self::Moloco => "moloco",
            Self::Applovin => "applovin",
            Self::TiktokFullAccess => "tiktok_full_access",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for UserSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
