use serde::Deserialize;

/// IP-intelligence response for one address (ipinfo.io shape).
///
/// Every field is optional; a missing or `null` field reads as `false` /
/// empty. Fields the policy does not use are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReputationRecord {
    #[serde(default)]
    pub bogon: Option<bool>,

    #[serde(default)]
    pub privacy: Option<Privacy>,

    #[serde(default)]
    pub company: Option<Company>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Privacy {
    #[serde(default)]
    pub hosting: Option<bool>,
    #[serde(default)]
    pub vpn: Option<bool>,
    #[serde(default)]
    pub proxy: Option<bool>,
    #[serde(default)]
    pub tor: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Company {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ReputationRecord {
    pub fn is_bogon(&self) -> bool {
        self.bogon.unwrap_or(false)
    }

    /// True when any of the hosting / vpn / proxy / tor flags is set.
    pub fn any_privacy_flag(&self) -> bool {
        match &self.privacy {
            Some(p) => [p.hosting, p.vpn, p.proxy, p.tor]
                .iter()
                .any(|flag| flag.unwrap_or(false)),
            None => false,
        }
    }

    /// Lowercased `company.type`, empty when absent.
    pub fn company_type(&self) -> String {
        self.company
            .as_ref()
            .and_then(|c| c.kind.as_deref())
            .unwrap_or("")
            .to_lowercase()
    }
}
