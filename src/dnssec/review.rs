//! Post-validation review of ranked entries and the missing-signature
//! handler.

use tracing::debug;

use super::errors::ValidationError;
use super::outcome::{Outcome, YieldReason};
use super::query::Query;
use super::rank::{Rank, RankedRRArray};
use super::zone_cut::{CutArena, ZoneCut};
use crate::dns::DomainName;
use crate::layer::LayerState;

/// Decide what a section's ranks mean for the query.
///
/// A signer mismatch moves the cut to the signer and asks for another pass.
/// Unsigned data hands over to [`rrsig_not_found`]; anything else short of
/// `Secure` fails the query.
pub fn check_validation_result(
    qry: &mut Query,
    cuts: &mut CutArena,
    rrs: &RankedRRArray,
    state: LayerState,
) -> Outcome {
    let live = || rrs.entries().iter().filter(|e| !e.yielded);

    if let Some(entry) = live().find(|e| e.rank == Rank::Mismatch) {
        return match entry.rrset.rrsig_signer(0) {
            Some(signer) => {
                debug!("Signer {} differs from zone cut {}", signer, qry.zone_cut.name);
                qry.zone_cut.name = signer;
                Outcome::Yield(YieldReason::Revalidate)
            }
            None => Outcome::Fail(ValidationError::UnvalidatedRecord {
                name: entry.rrset.name.clone(),
                rtype: entry.rrset.rtype,
                rank: entry.rank,
            }),
        };
    }

    for entry in live() {
        match entry.rank {
            Rank::Secure => continue,
            Rank::Insecure => {
                return rrsig_not_found(qry, cuts, &entry.rrset.name, state);
            }
            rank => {
                debug!("{} {} is {:?}", entry.rrset.name, entry.rrset.rtype, rank);
                return Outcome::Fail(ValidationError::UnvalidatedRecord {
                    name: entry.rrset.name.clone(),
                    rtype: entry.rrset.rtype,
                    rank,
                });
            }
        }
    }

    Outcome::Continue
}

/// Handle an unsigned RRset owned by `owner`.
///
/// Unsigned data at the cut itself, or on the second attempt, is bogus.
/// Otherwise the cut is presumed to lie one label below the longest common
/// suffix of `owner` and the current cut: descending copies the current
/// cut into the arena and inherits its keys, ascending reuses an ancestor's
/// keys when one with that name exists.
pub fn rrsig_not_found(
    qry: &mut Query,
    cuts: &mut CutArena,
    owner: &DomainName,
    state: LayerState,
) -> Outcome {
    if *owner == qry.zone_cut.name || state == LayerState::Yield {
        debug!("Couldn't validate RRSIGs for {}", owner);
        return Outcome::Fail(ValidationError::MissingSignature(owner.clone()));
    }

    let matched = qry.zone_cut.name.matched_labels(owner);
    let candidate = owner.suffix((matched + 1).min(owner.label_count()));

    if candidate.is_subdomain_of(&qry.zone_cut.name) {
        debug!("Presuming zone cut at {} below {}", candidate, qry.zone_cut.name);
        let mut cut = ZoneCut::new(candidate);
        cut.copy_trust_from(&qry.zone_cut);
        cut.parent = Some(cuts.alloc(qry.zone_cut.clone()));
        qry.zone_cut = cut;
        return Outcome::Yield(YieldReason::AwaitCut);
    }

    let ancestor = cuts
        .find(qry.zone_cut.parent, &candidate)
        .map(|(_, cut)| cut.clone());
    qry.zone_cut.init(candidate);
    match ancestor {
        Some(ancestor) => {
            debug!("Reusing keys of ancestor cut {}", ancestor.name);
            qry.zone_cut.copy_trust_from(&ancestor);
            qry.zone_cut.parent = ancestor.parent;
            Outcome::Yield(YieldReason::Revalidate)
        }
        None => Outcome::Yield(YieldReason::AwaitCut),
    }
}
