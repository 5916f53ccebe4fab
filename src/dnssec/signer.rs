use tracing::debug;

use super::errors::ValidationError;
use super::outcome::{Outcome, YieldReason};
use super::query::Query;
use super::rank::RankedRRArray;
use super::zone_cut::CutArena;
use crate::dns::DomainName;
use crate::layer::LayerState;

/// Signer of the first unranked RRSIG, answer section first
pub fn signature_authority(
    answer: &RankedRRArray,
    authority: &RankedRRArray,
) -> Option<DomainName> {
    answer.first_signer().or_else(|| authority.first_signer())
}

/// Make sure the active cut matches the zone that signed the response
/// before its DNSKEYs are trusted.
///
/// With no trust anchor held yet, or a signer equal to the anchor owner,
/// there is nothing to fix. Otherwise the cut is moved towards the signer
/// and the query yields; a second disagreement fails the query.
pub fn check_signer(
    qry: &mut Query,
    cuts: &CutArena,
    answer: &RankedRRArray,
    authority: &RankedRRArray,
    state: LayerState,
) -> Outcome {
    let signer = signature_authority(answer, authority);
    let Some(ta_name) = qry.zone_cut.trust_anchor_owner() else {
        return Outcome::Continue;
    };
    if signer.as_ref() == Some(ta_name) {
        return Outcome::Continue;
    }

    if state == LayerState::Yield {
        return Outcome::Fail(ValidationError::SignerMismatch {
            expected: qry.zone_cut.name.clone(),
            found: signer,
        });
    }

    let Some(signer) = signer else {
        debug!("Unsigned response at {}, fetching DS", qry.zone_cut.name);
        return Outcome::Yield(YieldReason::FetchDs);
    };

    if signer.is_subdomain_of(&qry.zone_cut.name) {
        debug!("Zone cut moves down to signer {}", signer);
        qry.zone_cut.name = signer;
        return Outcome::Yield(YieldReason::RefetchKeys);
    }

    if signer != qry.zone_cut.name {
        debug!("Zone cut moves up to signer {}", signer);
        let parent = qry.zone_cut.parent.and_then(|id| cuts.get(id)).cloned();
        let reason = match parent {
            Some(parent) => {
                qry.zone_cut = parent;
                YieldReason::RefetchKeys
            }
            None => YieldReason::AwaitCut,
        };
        qry.zone_cut.name = signer;
        return Outcome::Yield(reason);
    }

    // Cut name is right but its DS belongs elsewhere
    debug!("Trust anchor does not match cut {}, refetching", signer);
    Outcome::Yield(YieldReason::RefetchKeys)
}
