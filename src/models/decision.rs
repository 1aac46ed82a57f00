use std::fmt;

/// Why a request was refused. The message is what the denial page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReason {
    /// User-agent matched the bot signature table.
    KnownBot,
    /// Reputation service flagged the IP as reserved / non-routable.
    BogonIp,
    /// Hosting, cloud, VPN, proxy or Tor address.
    HostingNetwork,
}

impl BlockReason {
    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::KnownBot => "Blocked: known bot",
            BlockReason::BogonIp => "Blocked: bogon IP",
            BlockReason::HostingNetwork => "Access denied (hosting/cloud/VPN/proxy IP)",
        }
    }

    /// Short machine-friendly name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockReason::KnownBot => "known_bot",
            BlockReason::BogonIp => "bogon_ip",
            BlockReason::HostingNetwork => "hosting_network",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Terminal outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer with the 403 denial page.
    Block(BlockReason),
    /// Answer with a redirect.
    Redirect { location: String, status: u16 },
    /// Hand the request to the origin untouched.
    PassThrough,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Block(reason) => write!(f, "block ({})", reason.as_str()),
            Decision::Redirect { location, status } => write!(f, "redirect {} {}", status, location),
            Decision::PassThrough => write!(f, "pass"),
        }
    }
}
