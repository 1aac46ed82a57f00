use regex::{RegexSet, RegexSetBuilder};

/// User-agent signatures that are refused outright.
///
/// Matching is a case-insensitive OR over every entry; order is irrelevant.
pub struct BotSignatures {
    names: Vec<String>,
    set: RegexSet,
}

struct Signature {
    name: &'static str,
    pattern: &'static str,
}

const BUILTIN_SIGNATURES: &[Signature] = &[
    // Generic automation tokens. ASCII word boundaries, so "ébot" matches.
    Signature { name: "bot", pattern: r"(?-u:\b)bot(?-u:\b)" },
    Signature { name: "crawler", pattern: "crawler" },
    Signature { name: "spider", pattern: "spider" },
    Signature { name: "archiver", pattern: "archiver" },
    Signature { name: "uptime", pattern: "uptime" },
    Signature { name: "monitor", pattern: "monitor" },
    Signature { name: "validator", pattern: "validator" },
    Signature { name: "fetcher", pattern: "fetcher" },
    Signature { name: "scraper", pattern: "scrape" },
    // CLI and library HTTP clients
    Signature { name: "curl", pattern: "curl/" },
    Signature { name: "wget", pattern: "wget/" },
    Signature { name: "python-requests", pattern: "python-requests" },
    Signature { name: "httpclient", pattern: "httpclient" },
    // Search engines
    Signature { name: "Googlebot", pattern: "googlebot" },
    Signature { name: "Bingbot", pattern: "bingbot" },
    Signature { name: "Yandex", pattern: "yandex" },
    Signature { name: "Baiduspider", pattern: "baiduspider" },
    Signature { name: "DuckDuckBot", pattern: "duckduckbot" },
    // SEO tools
    Signature { name: "AhrefsBot", pattern: "ahrefsbot" },
    Signature { name: "SemrushBot", pattern: "semrushbot" },
    Signature { name: "MJ12bot", pattern: "mj12bot" },
    // Social platforms
    Signature { name: "facebookexternalhit", pattern: "facebookexternalhit" },
    Signature { name: "FacebookBot", pattern: "facebookbot" },
    Signature { name: "Twitterbot", pattern: "twitterbot" },
    Signature { name: "Slackbot", pattern: "slackbot" },
    Signature { name: "Discordbot", pattern: "discordbot" },
    Signature { name: "LinkedInBot", pattern: "linkedinbot" },
];

impl BotSignatures {
    /// Compile the built-in table plus operator-supplied patterns.
    pub fn new(extra: &[String]) -> Result<Self, regex::Error> {
        let mut names: Vec<String> = BUILTIN_SIGNATURES.iter().map(|s| s.name.to_string()).collect();
        let mut patterns: Vec<&str> = BUILTIN_SIGNATURES.iter().map(|s| s.pattern).collect();

        for pattern in extra {
            names.push(pattern.clone());
            patterns.push(pattern.as_str());
        }

        let set = RegexSetBuilder::new(&patterns)
            .case_insensitive(true)
            .build()?;

        Ok(Self { names, set })
    }

    /// Name of the first matching signature, if any.
    pub fn matched(&self, user_agent: &str) -> Option<&str> {
        self.set
            .matches(user_agent)
            .iter()
            .next()
            .map(|idx| self.names[idx].as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
