//! De-duplication and result aggregation for multi-domain commands.

use std::collections::BTreeSet;

use vbmc_common::{ControlResponse, FleetError, RC_OK};

/// Distinct names in stable (sorted) order.
#[must_use]
pub fn dedupe(names: Vec<String>) -> Vec<String> {
    names.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Worst result code wins; every non-empty message is kept in order.
#[must_use]
pub fn aggregate<I>(results: I) -> ControlResponse
where
    I: IntoIterator<Item = Result<(), FleetError>>,
{
    let mut response = ControlResponse::ok();
    for result in results {
        if let Err(err) = result {
            response.rc = response.rc.max(err.rc());
            let msg = err.to_string();
            if !msg.is_empty() {
                response.msg.push(msg);
            }
        }
    }
    debug_assert!(response.rc >= RC_OK);
    response
}
