use std::sync::Arc;

use tracing::{debug, info};

use crate::models::decision::{BlockReason, Decision};
use crate::models::request::IncomingRequest;

use super::bot_signatures::BotSignatures;
use super::ip_resolver::resolve_client_ip;
use super::policy::ReputationPolicy;
use super::reputation::ReputationSource;

/// Per-request classifier. Stages run top to bottom and the first one that
/// reaches a verdict ends evaluation:
///
/// 1. Bot signature match on the user-agent.
/// 2. Client IP resolution (nothing resolvable -> pass).
/// 3. Reputation lookup and policy.
///
/// Anything uncertain (no IP, no credential, failed lookup) passes the
/// request through. Shared state is read-only after construction.
pub struct RequestClassifier {
    bots: BotSignatures,
    reputation: Arc<dyn ReputationSource>,
    policy: ReputationPolicy,
}

impl RequestClassifier {
    pub fn new(
        bots: BotSignatures,
        reputation: Arc<dyn ReputationSource>,
        policy: ReputationPolicy,
    ) -> Self {
        Self {
            bots,
            reputation,
            policy,
        }
    }

    pub async fn classify(&self, req: &IncomingRequest) -> Decision {
        let ua = req.user_agent_lower();
        if let Some(signature) = self.bots.matched(&ua) {
            info!(signature = signature, user_agent = %ua, "Known bot blocked");
            return Decision::Block(BlockReason::KnownBot);
        }

        let ip = match resolve_client_ip(req) {
            Some(ip) => ip,
            None => {
                debug!("No client IP resolvable - passing through");
                return Decision::PassThrough;
            }
        };

        let decision = match self.reputation.lookup(&ip).await {
            Ok(record) => self.policy.evaluate(&record),
            Err(err) => {
                debug!(
                    client_ip = %ip,
                    source = self.reputation.name(),
                    cause = err.code(),
                    error = %err,
                    "Reputation unavailable - passing through"
                );
                Decision::PassThrough
            }
        };

        match &decision {
            Decision::Block(reason) => {
                info!(client_ip = %ip, reason = reason.as_str(), "Request blocked");
            }
            Decision::Redirect { location, status } => {
                info!(client_ip = %ip, status = *status, location = %location, "ISP user redirected");
            }
            Decision::PassThrough => {
                debug!(client_ip = %ip, "Request passed");
            }
        }

        decision
    }
}
