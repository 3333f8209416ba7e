use tracing::{debug, warn};

use floatdeck_gateway::Gateway;
use floatdeck_schema::ProfilePoint;

/// Linear probe over a curated candidate list, first non-empty profile
/// wins. A candidate that errors is logged and skipped; exhaustion
/// returns an empty sequence, which the view renders as "no data".
pub async fn find_profile(
    gateway: &dyn Gateway,
    candidates: &[String],
    cycle: u32,
) -> Vec<ProfilePoint> {
    for float_id in candidates {
        match gateway.profile(float_id, cycle).await {
            Ok(profile) if !profile.is_empty() => {
                debug!(%float_id, points = profile.len(), "profile found");
                return profile;
            }
            Ok(_) => {
                debug!(%float_id, "no profile data, trying next candidate");
            }
            Err(err) => {
                warn!(%float_id, %err, "profile fetch failed, trying next candidate");
            }
        }
    }
    Vec::new()
}
