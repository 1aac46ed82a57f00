use crate::config::settings::RedirectConfig;
use crate::models::decision::{BlockReason, Decision};
use crate::models::reputation::ReputationRecord;

/// Turns a reputation record into a decision.
///
/// Rules, first match wins:
/// 1. bogon -> block
/// 2. hosting-like and not a clean ISP -> block
/// 3. clean ISP -> redirect
/// 4. anything else -> pass
///
/// A network is hosting-like when any privacy flag is set or its company
/// type is `hosting` or `business`. A clean ISP has company type `isp` and
/// no privacy flag.
#[derive(Debug, Clone)]
pub struct ReputationPolicy {
    redirect_location: String,
    redirect_status: u16,
}

impl ReputationPolicy {
    pub fn new(redirect: &RedirectConfig) -> Self {
        Self {
            redirect_location: redirect.location.clone(),
            redirect_status: redirect.status,
        }
    }

    pub fn evaluate(&self, record: &ReputationRecord) -> Decision {
        if record.is_bogon() {
            return Decision::Block(BlockReason::BogonIp);
        }

        let flagged = record.any_privacy_flag();
        let company_type = record.company_type();

        let is_hosting = flagged || company_type == "hosting" || company_type == "business";
        let is_isp_user = company_type == "isp" && !flagged;

        if is_hosting && !is_isp_user {
            Decision::Block(BlockReason::HostingNetwork)
        } else if is_isp_user {
            Decision::Redirect {
                location: self.redirect_location.clone(),
                status: self.redirect_status,
            }
        } else {
            Decision::PassThrough
        }
    }
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self::new(&crate::config::defaults::default_redirect_config())
    }
}
