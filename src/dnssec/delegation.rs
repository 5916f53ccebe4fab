use tracing::{debug, trace};

use super::errors::{DenialError, Result, ValidationError};
use super::query::Query;
use super::verifier::DenialChecker;
use crate::dns::enums::DNSResourceType;
use crate::dns::resource::DNSResource;
use crate::dns::{DNSPacket, RRset, Section};

/// What the response taught about the delegation below the active cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationStatus {
    /// Not a referral and not a DS answer
    Unchanged,
    /// DS records installed as the cut's trust anchor
    Secured,
    /// DS absence proven, the delegation is unsigned
    ProvenInsecure,
}

/// Aggregate the DS records of a section into one RRset.
///
/// The owner of the first DS record decides the set; DS records for other
/// owners do not belong to this delegation and are ignored.
pub fn aggregate_ds(records: &[DNSResource]) -> Option<RRset> {
    let mut ds_records = records.iter().filter(|rr| rr.rtype == DNSResourceType::DS);
    let first = ds_records.next()?;
    let mut ds = RRset::from_record(first);

    for rr in ds_records {
        if ds.accepts(rr) {
            ds.ttl = ds.ttl.min(rr.ttl);
            ds.insert(rr.rdata.clone());
        } else {
            trace!("Ignoring DS for {} while aggregating {}", rr.name, ds.name);
        }
    }
    Some(ds)
}

/// Learn the DS set of the next delegation from a referral or a DS answer,
/// or prove there is none.
pub fn update_delegation(
    qry: &mut Query,
    packet: &DNSPacket,
    has_nsec3: bool,
    denial: &dyn DenialChecker,
) -> Result<DelegationStatus> {
    let referral = !packet.is_authoritative();
    let section = if referral {
        Section::Authority
    } else if packet.qtype() == Some(DNSResourceType::DS) {
        Section::Answer
    } else {
        return Ok(DelegationStatus::Unchanged);
    };

    if let Some(ds) = aggregate_ds(packet.section(section)) {
        debug!("Trust anchor for {} now {} DS records at {}", qry.sname, ds.len(), ds.name);
        qry.zone_cut.trust_anchor = Some(ds);
        return Ok(DelegationStatus::Secured);
    }

    let proved_name = packet.qname();
    let proof = match (has_nsec3, referral) {
        (false, true) => denial.nsec_ref_to_unsigned(packet),
        (false, false) => {
            denial.nsec_existence_denial(packet, Section::Authority, &proved_name, DNSResourceType::DS)
        }
        (true, true) => denial.nsec3_ref_to_unsigned(packet),
        (true, false) => denial.nsec3_no_data(packet, Section::Authority, &proved_name, DNSResourceType::DS),
    };

    match proof {
        Ok(()) => {}
        Err(DenialError::OptOut) if has_nsec3 => {
            debug!("NSEC3 opt-out covers {}, going insecure", proved_name);
        }
        Err(e) => {
            debug!("Bogus proof of DS non-existence for {}: {}", proved_name, e);
            return Err(ValidationError::BadDsDenial(e));
        }
    }
    debug!("Proven unsigned delegation at {}", proved_name);
    Ok(DelegationStatus::ProvenInsecure)
}
