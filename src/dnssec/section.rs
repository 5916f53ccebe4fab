use tracing::{debug, trace};

use super::errors::{Result, ValidationError};
use super::query::Query;
use super::rank::{Rank, RankedRRArray};
use super::verifier::{RrsetVerdict, RrsetVerifier, ValidationContext, ValidationFlags};
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, Section};

/// Whether a section pass met any RRSIG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    Signed,
    NoRrsig,
}

/// Rank every pending entry of `rrs` against the context keys.
///
/// RRSIG entries rank by their signer alone, authority NS sets are taken
/// as is (delegations are unsigned), everything else goes to the verifier.
pub fn validate_section(
    ctx: &mut ValidationContext<'_>,
    rrs: &mut RankedRRArray,
    verifier: &dyn RrsetVerifier,
) -> Result<SectionStatus> {
    let keys = ctx.keys.ok_or(ValidationError::NoDnsKey)?;
    ctx.zone_name = Some(keys.name.clone());
    let mut rrsig_found = false;

    for entry in rrs.entries_mut().iter_mut().filter(|e| e.is_pending()) {
        let rrset = &entry.rrset;

        if rrset.rtype == DNSResourceType::RRSIG {
            let signer = rrset.rrsig_signer(0);
            entry.rank = if signer.as_ref() == ctx.zone_name.as_ref() {
                Rank::Secure
            } else {
                Rank::Mismatch
            };
            rrsig_found = true;
            continue;
        }

        if ctx.section == Section::Authority && rrset.rtype == DNSResourceType::NS {
            entry.rank = Rank::Secure;
            continue;
        }

        entry.rank = match verifier.validate_rrset(ctx, rrset) {
            RrsetVerdict::Secure => Rank::Secure,
            RrsetVerdict::NoSignature => Rank::Insecure,
            RrsetVerdict::Invalid => Rank::Bogus,
            RrsetVerdict::Error(e) => {
                debug!("Could not verify {} {}: {}", rrset.name, rrset.rtype, e);
                Rank::Unknown
            }
        };
        trace!("{} {} ranked {:?}", rrset.name, rrset.rtype, entry.rank);
    }

    Ok(if rrsig_found {
        SectionStatus::Signed
    } else {
        SectionStatus::NoRrsig
    })
}

/// Outcome of validating both selected sections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordsStatus {
    /// Neither section carried an RRSIG
    pub unsigned: bool,
    /// The answer section was synthesized from a wildcard
    pub wildcard_expanded: bool,
}

/// Validate the selected answer, then the selected authority records.
///
/// An authority section without signatures is fine as long as the answer
/// had some; only when both lack them is the response reported unsigned.
pub fn validate_records(
    qry: &Query,
    packet: &DNSPacket,
    answer: &mut RankedRRArray,
    authority: &mut RankedRRArray,
    verifier: &dyn RrsetVerifier,
) -> Result<RecordsStatus> {
    let keys = qry.zone_cut.key.as_ref().ok_or(ValidationError::NoDnsKey)?;

    let mut ctx = ValidationContext::new(packet, Section::Answer, qry.timestamp).with_keys(Some(keys));
    let answer_status = validate_section(&mut ctx, answer, verifier)?;
    let wildcard_expanded = ctx.flags.contains(ValidationFlags::WILDCARD_EXPANSION);

    let mut ctx = ValidationContext::new(packet, Section::Authority, qry.timestamp).with_keys(Some(keys));
    let authority_status = validate_section(&mut ctx, authority, verifier)?;

    Ok(RecordsStatus {
        unsigned: answer_status == SectionStatus::NoRrsig
            && authority_status == SectionStatus::NoRrsig,
        wildcard_expanded,
    })
}
