use ring::digest;
use tracing::{debug, trace};

use super::errors::DenialError;
use super::verifier::DenialChecker;
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::{Nsec, Nsec3, TypeBitmap};
use crate::dns::{DNSPacket, DomainName, Section};

/// NSEC3 hash algorithm number for SHA-1, the only one defined
const NSEC3_HASH_SHA1: u8 = 1;

const BASE32HEX: base32::Alphabet = base32::Alphabet::Rfc4648Hex { padding: false };

type Result<T> = std::result::Result<T, DenialError>;

/// NSEC/NSEC3 denial of existence proofs over packet sections
#[derive(Debug, Clone)]
pub struct NsecDenialChecker {
    max_nsec3_iterations: u16,
}

impl NsecDenialChecker {
    pub fn new(max_nsec3_iterations: u16) -> Self {
        Self {
            max_nsec3_iterations,
        }
    }
}

/// Iterated NSEC3 hash of a name (RFC 5155 section 5)
pub fn nsec3_hash(name: &DomainName, salt: &[u8], iterations: u16) -> Vec<u8> {
    let mut input = name.to_wire();
    input.extend_from_slice(salt);
    let mut hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &input);

    for _ in 0..iterations {
        let mut next_input = hash.as_ref().to_vec();
        next_input.extend_from_slice(salt);
        hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &next_input);
    }

    hash.as_ref().to_vec()
}

/// Owner label form of an NSEC3 hash
pub fn encode_hash(hash: &[u8]) -> String {
    base32::encode(BASE32HEX, hash).to_ascii_lowercase()
}

fn decode_hash(label: &[u8]) -> Option<Vec<u8>> {
    let label = std::str::from_utf8(label).ok()?;
    base32::decode(BASE32HEX, &label.to_ascii_uppercase())
}

/// Whether `name` lies strictly between `owner` and `next` in a chain that
/// wraps around at the end
fn in_span<T: Ord + ?Sized>(owner: &T, next: &T, name: &T) -> bool {
    if owner < next {
        owner < name && name < next
    } else {
        name > owner || name < next
    }
}

/// Bitmap check for a record matching the query name
fn check_types(types: &TypeBitmap, owner: &DomainName, stype: DNSResourceType) -> Result<()> {
    if types.contains(stype) {
        return Err(DenialError::TypeExists(stype, owner.clone()));
    }
    if types.contains(DNSResourceType::CNAME) {
        return Err(DenialError::TypeExists(DNSResourceType::CNAME, owner.clone()));
    }
    // RFC 6840 section 4.1
    if stype != DNSResourceType::DS
        && types.contains(DNSResourceType::NS)
        && !types.contains(DNSResourceType::SOA)
    {
        return Err(DenialError::ParentSide(owner.clone()));
    }
    Ok(())
}

/// Check the NSEC/NSEC3 record found at a referral's delegation point
fn check_delegation_types(types: &TypeBitmap, delegation: &DomainName) -> Result<()> {
    if types.contains(DNSResourceType::DS) {
        return Err(DenialError::SignedDelegation(delegation.clone()));
    }
    if !types.contains(DNSResourceType::NS) || types.contains(DNSResourceType::SOA) {
        return Err(DenialError::NotADelegation);
    }
    Ok(())
}

fn delegation_point(packet: &DNSPacket) -> Result<DomainName> {
    packet
        .authorities
        .iter()
        .find(|rr| rr.rtype == DNSResourceType::NS)
        .map(|rr| rr.name.clone())
        .ok_or(DenialError::NotADelegation)
}

struct NsecRecord {
    owner: DomainName,
    nsec: Nsec,
}

struct NsecChain {
    records: Vec<NsecRecord>,
}

impl NsecChain {
    fn from_section(packet: &DNSPacket, section: Section) -> Result<Self> {
        let records: Vec<NsecRecord> = packet
            .section(section)
            .iter()
            .filter(|rr| rr.rtype == DNSResourceType::NSEC)
            .filter_map(|rr| match Nsec::parse(&rr.rdata) {
                Ok(nsec) => Some(NsecRecord {
                    owner: rr.name.clone(),
                    nsec,
                }),
                Err(e) => {
                    debug!("Skipping malformed NSEC at {}: {}", rr.name, e);
                    None
                }
            })
            .collect();

        if records.is_empty() {
            return Err(DenialError::NoRecords);
        }
        Ok(Self { records })
    }

    fn matching(&self, name: &DomainName) -> Option<&NsecRecord> {
        self.records.iter().find(|r| &r.owner == name)
    }

    fn covering(&self, name: &DomainName) -> Option<&NsecRecord> {
        self.records
            .iter()
            .find(|r| in_span(&r.owner, &r.nsec.next_name, name))
    }

    /// Closest encloser implied by the record covering `name`
    fn closest_encloser(name: &DomainName, covering: &NsecRecord) -> DomainName {
        let labels = name
            .matched_labels(&covering.owner)
            .max(name.matched_labels(&covering.nsec.next_name));
        name.suffix(labels)
    }
}

struct Nsec3Record {
    hash: Vec<u8>,
    zone: DomainName,
    nsec3: Nsec3,
}

/// NSEC3 records of one section sharing the same hash parameters
struct Nsec3Chain {
    records: Vec<Nsec3Record>,
    salt: Vec<u8>,
    iterations: u16,
}

struct ClosestEncloserProof<'a> {
    closest: DomainName,
    covering: &'a Nsec3Record,
}

impl Nsec3Chain {
    fn from_section(packet: &DNSPacket, section: Section, max_iterations: u16) -> Result<Self> {
        let mut records = Vec::new();
        let mut over_limit = None;

        for rr in packet.section(section).iter().filter(|rr| rr.rtype == DNSResourceType::NSEC3) {
            let nsec3 = match Nsec3::parse(&rr.rdata) {
                Ok(nsec3) => nsec3,
                Err(e) => {
                    debug!("Skipping malformed NSEC3 at {}: {}", rr.name, e);
                    continue;
                }
            };
            if nsec3.hash_algorithm != NSEC3_HASH_SHA1 {
                continue;
            }
            if nsec3.iterations > max_iterations {
                over_limit = Some(nsec3.iterations);
                continue;
            }
            let (Some(label), Some(zone)) = (rr.name.labels().first(), rr.name.parent()) else {
                continue;
            };
            let Some(hash) = decode_hash(label) else {
                trace!("NSEC3 owner {} is not a base32hex hash", rr.name);
                continue;
            };
            records.push(Nsec3Record { hash, zone, nsec3 });
        }

        let Some(first) = records.first() else {
            return Err(match over_limit {
                Some(iterations) => DenialError::TooManyIterations(iterations),
                None => DenialError::NoRecords,
            });
        };
        let salt = first.nsec3.salt.clone();
        let iterations = first.nsec3.iterations;
        records.retain(|r| r.nsec3.salt == salt && r.nsec3.iterations == iterations);

        Ok(Self {
            records,
            salt,
            iterations,
        })
    }

    fn hash(&self, name: &DomainName) -> Vec<u8> {
        nsec3_hash(name, &self.salt, self.iterations)
    }

    fn matching(&self, name: &DomainName) -> Option<&Nsec3Record> {
        let hash = self.hash(name);
        self.records
            .iter()
            .find(|r| r.hash == hash && name.is_at_or_below(&r.zone))
    }

    fn covering(&self, name: &DomainName) -> Option<&Nsec3Record> {
        let hash = self.hash(name);
        self.records.iter().find(|r| {
            name.is_at_or_below(&r.zone)
                && in_span(r.hash.as_slice(), r.nsec3.next_hashed_owner.as_slice(), hash.as_slice())
        })
    }

    /// Closest provable encloser of `name` with the record covering the
    /// next closer name (RFC 5155 section 8.3)
    fn closest_encloser(&self, name: &DomainName) -> Result<ClosestEncloserProof<'_>> {
        let mut next_closer = name.clone();
        let mut candidate = name.parent();

        while let Some(closest) = candidate {
            if self.matching(&closest).is_some() {
                return match self.covering(&next_closer) {
                    Some(covering) => Ok(ClosestEncloserProof { closest, covering }),
                    None => Err(DenialError::NotCovered(next_closer)),
                };
            }
            candidate = closest.parent();
            next_closer = closest;
        }

        Err(DenialError::NoClosestEncloser(name.clone()))
    }
}

impl DenialChecker for NsecDenialChecker {
    fn nsec_name_error(&self, packet: &DNSPacket, section: Section, sname: &DomainName) -> Result<()> {
        let chain = NsecChain::from_section(packet, section)?;
        if chain.matching(sname).is_some() {
            return Err(DenialError::NameExists(sname.clone()));
        }
        let covering = chain
            .covering(sname)
            .ok_or_else(|| DenialError::NotCovered(sname.clone()))?;

        let wildcard = NsecChain::closest_encloser(sname, covering).wildcard()?;
        if chain.matching(&wildcard).is_some() || chain.covering(&wildcard).is_none() {
            return Err(DenialError::WildcardNotDenied(wildcard));
        }
        trace!("NSEC proves {} does not exist", sname);
        Ok(())
    }

    fn nsec_existence_denial(
        &self,
        packet: &DNSPacket,
        section: Section,
        sname: &DomainName,
        stype: DNSResourceType,
    ) -> Result<()> {
        let chain = NsecChain::from_section(packet, section)?;
        if let Some(record) = chain.matching(sname) {
            return check_types(&record.nsec.types, sname, stype);
        }

        let covering = chain
            .covering(sname)
            .ok_or_else(|| DenialError::NotCovered(sname.clone()))?;
        // empty non-terminal
        if covering.nsec.next_name.is_subdomain_of(sname) {
            return Ok(());
        }

        let wildcard = NsecChain::closest_encloser(sname, covering).wildcard()?;
        match chain.matching(&wildcard) {
            Some(record) => check_types(&record.nsec.types, &wildcard, stype),
            None => Err(DenialError::WildcardNotDenied(wildcard)),
        }
    }

    fn nsec_ref_to_unsigned(&self, packet: &DNSPacket) -> Result<()> {
        let delegation = delegation_point(packet)?;
        let chain = NsecChain::from_section(packet, Section::Authority)?;
        match chain.matching(&delegation) {
            Some(record) => check_delegation_types(&record.nsec.types, &delegation),
            None => Err(DenialError::NotCovered(delegation)),
        }
    }

    fn nsec3_name_error(&self, packet: &DNSPacket, section: Section, sname: &DomainName) -> Result<()> {
        let chain = Nsec3Chain::from_section(packet, section, self.max_nsec3_iterations)?;
        if chain.matching(sname).is_some() {
            return Err(DenialError::NameExists(sname.clone()));
        }

        let proof = chain.closest_encloser(sname)?;
        let wildcard = proof.closest.wildcard()?;
        if chain.covering(&wildcard).is_none() {
            return Err(DenialError::WildcardNotDenied(wildcard));
        }
        trace!("NSEC3 proves {} does not exist below {}", sname, proof.closest);
        Ok(())
    }

    fn nsec3_no_data(
        &self,
        packet: &DNSPacket,
        section: Section,
        sname: &DomainName,
        stype: DNSResourceType,
    ) -> Result<()> {
        let chain = Nsec3Chain::from_section(packet, section, self.max_nsec3_iterations)?;
        if let Some(record) = chain.matching(sname) {
            return check_types(&record.nsec3.types, sname, stype);
        }

        let proof = chain.closest_encloser(sname)?;
        let wildcard = proof.closest.wildcard()?;
        if let Some(record) = chain.matching(&wildcard) {
            return check_types(&record.nsec3.types, &wildcard, stype);
        }

        // RFC 5155 section 8.6, only a DS query may end in an opt-out span
        if stype == DNSResourceType::DS && proof.covering.nsec3.opt_out() {
            return Err(DenialError::OptOut);
        }
        Err(DenialError::NotCovered(sname.clone()))
    }

    fn nsec3_ref_to_unsigned(&self, packet: &DNSPacket) -> Result<()> {
        let delegation = delegation_point(packet)?;
        let chain = Nsec3Chain::from_section(packet, Section::Authority, self.max_nsec3_iterations)?;
        if let Some(record) = chain.matching(&delegation) {
            return check_delegation_types(&record.nsec3.types, &delegation);
        }

        let proof = chain.closest_encloser(&delegation)?;
        if proof.covering.nsec3.opt_out() {
            return Err(DenialError::OptOut);
        }
        Err(DenialError::NotCovered(delegation))
    }
}
