use thiserror::Error;

use super::query::QueryId;
use super::rank::Rank;
use crate::dns::enums::DNSResourceType;
use crate::dns::{DomainName, ParseError};

/// DNSSEC validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Response lacks DNSSEC records although they were requested
    #[error("Insecure response to a DNSSEC query")]
    InsecureResponse,
    /// No DNSKEY held by the zone cut
    #[error("No DNSKEY record found for validation")]
    NoDnsKey,
    /// No DS held by the zone cut
    #[error("No trust anchor held for {0}")]
    NoTrustAnchor(DomainName),
    /// None of the keys in the DNSKEY set is anchored by the DS set
    #[error("No DNSKEY matches the trust anchor and signs the key set")]
    NoTrustedKey,
    #[error("Bad keys, broken trust chain: {0}")]
    BrokenTrustChain(Box<ValidationError>),
    #[error("Bad NXDOMAIN proof: {0}")]
    BadNameErrorProof(DenialError),
    #[error("Bad NODATA proof: {0}")]
    BadNoDataProof(DenialError),
    #[error("Bogus proof of DS non-existence: {0}")]
    BadDsDenial(DenialError),
    /// Signer and zone cut still disagree after one revalidation
    #[error("Signer {found:?} does not match zone cut {expected} after revalidation")]
    SignerMismatch {
        expected: DomainName,
        found: Option<DomainName>,
    },
    #[error("Couldn't validate RRSIGs for {0}")]
    MissingSignature(DomainName),
    #[error("{rtype} RRset at {name} left in rank {rank:?}")]
    UnvalidatedRecord {
        name: DomainName,
        rtype: DNSResourceType,
        rank: Rank,
    },
    #[error("No RRSIG record found for RRset")]
    NoRrsig,
    #[error("DNSSEC signature has expired or is not yet valid")]
    SignatureNotCurrent,
    #[error("DNSSEC signature verification failed")]
    SignatureVerificationFailed,
    #[error("Unsupported DNSSEC algorithm: {0}")]
    UnsupportedAlgorithm(u8),
    #[error("Unsupported digest type: {0}")]
    UnsupportedDigestType(u8),
    #[error("Invalid DNSKEY public key format")]
    InvalidPublicKey,
    #[error("Malformed DNSSEC record: {0}")]
    Malformed(#[from] ParseError),

    // Internal failures, never a statement about the data
    #[error("Query {0:?} is not part of the resolution plan")]
    UnknownQuery(QueryId),
    #[error("No {0} material to hand to the parent query")]
    MissingKeyMaterial(DNSResourceType),
}

impl ValidationError {
    /// Whether this error condemns the data (BOGUS) rather than the
    /// resolver's own bookkeeping
    pub fn is_bogus(&self) -> bool {
        !matches!(
            self,
            Self::UnknownQuery(_) | Self::MissingKeyMaterial(_)
        )
    }
}

/// Outcome of a failed NSEC/NSEC3 proof
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenialError {
    /// NSEC3 opt-out span covers the name, a proof cannot be built
    #[error("NSEC3 opt-out covers the name, proof not constructible")]
    OptOut,
    #[error("No NSEC/NSEC3 records in section")]
    NoRecords,
    #[error("No record covers {0}")]
    NotCovered(DomainName),
    #[error("Name {0} exists")]
    NameExists(DomainName),
    #[error("Type {0} exists at {1}")]
    TypeExists(DNSResourceType, DomainName),
    #[error("Parent-side NSEC at {0} cannot deny child data")]
    ParentSide(DomainName),
    #[error("No closest encloser for {0}")]
    NoClosestEncloser(DomainName),
    #[error("Wildcard {0} not denied")]
    WildcardNotDenied(DomainName),
    #[error("Referral without NS records")]
    NotADelegation,
    #[error("Delegation {0} is signed")]
    SignedDelegation(DomainName),
    #[error("NSEC3 iterations {0} above limit")]
    TooManyIterations(u16),
    #[error("Malformed denial record: {0}")]
    Malformed(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_errors_are_not_bogus() {
        assert!(ValidationError::InsecureResponse.is_bogus());
        assert!(ValidationError::BadNoDataProof(DenialError::NoRecords).is_bogus());
        assert!(!ValidationError::MissingKeyMaterial(DNSResourceType::DS).is_bogus());
        assert!(!ValidationError::UnknownQuery(QueryId(7)).is_bogus());
    }

    #[test]
    fn test_messages_name_the_record() {
        let err = ValidationError::MissingSignature("www.example.com".parse().unwrap());
        assert_eq!(err.to_string(), "Couldn't validate RRSIGs for www.example.com.");
    }
}
