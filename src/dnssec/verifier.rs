//! Seams to the cryptographic and denial-of-existence primitives.
//!
//! The validation engine only decides what to verify and what a result
//! means for the query. Signature checks and NSEC/NSEC3 proofs are behind
//! these traits; [`RingVerifier`](super::crypto::RingVerifier) and
//! [`NsecDenialChecker`](super::denial::NsecDenialChecker) are the default
//! implementations.

use bitflags::bitflags;

use super::errors::{DenialError, ValidationError};
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, DomainName, RRset, Section};

bitflags! {
    /// Side effects reported by the verifier
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ValidationFlags: u8 {
        /// A signature proved the RRset was synthesized from a wildcard
        const WILDCARD_EXPANSION = 1 << 0;
    }
}

/// Inputs for verifying one packet section
#[derive(Debug, Clone)]
pub struct ValidationContext<'a> {
    pub packet: &'a DNSPacket,
    pub section: Section,
    /// DNSKEY set of the zone cut
    pub keys: Option<&'a RRset>,
    /// Name the signatures are expected from
    pub zone_name: Option<DomainName>,
    pub timestamp: u32,
    pub has_nsec3: bool,
    pub flags: ValidationFlags,
}

impl<'a> ValidationContext<'a> {
    pub fn new(packet: &'a DNSPacket, section: Section, timestamp: u32) -> Self {
        Self {
            packet,
            section,
            keys: None,
            zone_name: None,
            timestamp,
            has_nsec3: packet.has_type(DNSResourceType::NSEC3),
            flags: ValidationFlags::empty(),
        }
    }

    pub fn with_keys(mut self, keys: Option<&'a RRset>) -> Self {
        self.zone_name = keys.map(|k| k.name.clone());
        self.keys = keys;
        self
    }
}

/// Result of verifying one RRset against the context keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RrsetVerdict {
    Secure,
    /// No covering RRSIG in the section
    NoSignature,
    /// Signatures present, none verifies
    Invalid,
    /// Verification could not be carried out
    Error(ValidationError),
}

/// Result of checking a DNSKEY set against the cut's DS set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnskeyTrust {
    Trusted,
    /// Keys verify but belong to a different cut than the expected one
    CutMismatch,
    Untrusted(ValidationError),
}

pub trait RrsetVerifier: Send + Sync {
    /// Verify `rrset` with the context keys. Sets
    /// [`ValidationFlags::WILDCARD_EXPANSION`] on the context when the
    /// verifying signature proves wildcard synthesis.
    fn validate_rrset(&self, ctx: &mut ValidationContext<'_>, rrset: &RRset) -> RrsetVerdict;

    /// Check that the context keys are vouched for by `trust_anchor` and
    /// that one such key signs the DNSKEY set
    fn dnskeys_trusted(
        &self,
        ctx: &mut ValidationContext<'_>,
        trust_anchor: Option<&RRset>,
    ) -> DnskeyTrust;
}

/// Authenticated denial of existence proofs (RFC 4035 section 5.4,
/// RFC 5155 section 8)
pub trait DenialChecker: Send + Sync {
    fn nsec_name_error(
        &self,
        packet: &DNSPacket,
        section: Section,
        sname: &DomainName,
    ) -> Result<(), DenialError>;

    fn nsec_existence_denial(
        &self,
        packet: &DNSPacket,
        section: Section,
        sname: &DomainName,
        stype: DNSResourceType,
    ) -> Result<(), DenialError>;

    /// Referral proves the delegation is unsigned
    fn nsec_ref_to_unsigned(&self, packet: &DNSPacket) -> Result<(), DenialError>;

    fn nsec3_name_error(
        &self,
        packet: &DNSPacket,
        section: Section,
        sname: &DomainName,
    ) -> Result<(), DenialError>;

    fn nsec3_no_data(
        &self,
        packet: &DNSPacket,
        section: Section,
        sname: &DomainName,
        stype: DNSResourceType,
    ) -> Result<(), DenialError>;

    fn nsec3_ref_to_unsigned(&self, packet: &DNSPacket) -> Result<(), DenialError>;
}
