use tracing::{debug, trace};

use super::algorithm::DnsSecAlgorithm;
use super::digest::DigestType;
use super::errors::{Result, ValidationError};
use super::query::unix_now;
use super::verifier::{DnskeyTrust, RrsetVerdict, RrsetVerifier, ValidationContext, ValidationFlags};
use crate::dns::enums::DNSResourceType;
use crate::dns::rdata::{Dnskey, Ds, Rrsig, canonical_rdata};
use crate::dns::{DomainName, RRset};

/// Signature verification with `ring`
#[derive(Debug, Clone, Default)]
pub struct RingVerifier {
    /// Current time for signature validity checks (for testing)
    current_time: Option<u32>,
}

impl RingVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set current time for testing
    pub fn set_current_time(&mut self, time: u32) {
        self.current_time = Some(time);
    }

    fn now(&self, ctx: &ValidationContext<'_>) -> u32 {
        match (self.current_time, ctx.timestamp) {
            (Some(time), _) => time,
            (None, 0) => unix_now(),
            (None, timestamp) => timestamp,
        }
    }

    /// RRSIGs in the context section covering `rrset`
    fn covering_signatures(ctx: &ValidationContext<'_>, rrset: &RRset) -> Vec<Rrsig> {
        ctx.packet
            .section(ctx.section)
            .iter()
            .filter(|rr| {
                rr.rtype == DNSResourceType::RRSIG
                    && rr.name == rrset.name
                    && rr.rclass == rrset.rclass
                    && rr.covered_type() == Some(rrset.rtype)
            })
            .filter_map(|rr| match rr.rrsig() {
                Some(sig) => Some(sig),
                None => {
                    debug!("Skipping malformed RRSIG at {}", rr.name);
                    None
                }
            })
            .collect()
    }

    /// Verify one RRSIG over `rrset` with any matching key of `keys`.
    /// Returns whether the signature proves wildcard expansion.
    fn verify_with_keys(&self, rrset: &RRset, sig: &Rrsig, keys: &RRset, now: u32) -> Result<bool> {
        let owner_labels = rrset.name.label_count() - usize::from(rrset.name.is_wildcard());
        if usize::from(sig.labels) > owner_labels {
            return Err(ValidationError::SignatureVerificationFailed);
        }
        if !sig.is_current(now) {
            return Err(ValidationError::SignatureNotCurrent);
        }
        let algorithm = DnsSecAlgorithm::from_u8(sig.algorithm)
            .ok_or(ValidationError::UnsupportedAlgorithm(sig.algorithm))?;

        let data = signed_data(rrset, sig)?;
        let mut last_err = ValidationError::NoDnsKey;

        for rdata in keys.rdata() {
            let key = Dnskey::parse(rdata)?;
            if !key.is_zone_key()
                || key.is_revoked()
                || key.algorithm != sig.algorithm
                || key.key_tag() != sig.key_tag
            {
                continue;
            }
            match algorithm.verify(&key.public_key, &data, &sig.signature) {
                Ok(()) => return Ok(usize::from(sig.labels) < owner_labels),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Whether a DS record vouches for `key`
    fn ds_matches(owner: &DomainName, key_rdata: &[u8], key: &Dnskey, ds: &Ds) -> bool {
        if ds.algorithm != key.algorithm || ds.key_tag != key.key_tag() {
            return false;
        }
        DigestType::from_u8(ds.digest_type)
            .and_then(|ty| ty.dnskey_digest(owner, key_rdata))
            .is_some_and(|digest| digest == ds.digest)
    }
}

/// Signed data of RFC 4034 section 3.1.8.1: RRSIG RDATA without the
/// signature, then the RRset in canonical form and order (section 6)
pub fn signed_data(rrset: &RRset, sig: &Rrsig) -> Result<Vec<u8>> {
    let owner = if usize::from(sig.labels) < rrset.name.label_count() {
        rrset.name.suffix(usize::from(sig.labels)).wildcard()?
    } else {
        rrset.name.clone()
    };
    let owner_wire = owner.to_wire();

    let mut rdatas: Vec<_> = rrset
        .rdata()
        .iter()
        .map(|rdata| canonical_rdata(rrset.rtype, rdata))
        .collect();
    rdatas.sort();
    rdatas.dedup();

    let mut data = sig.signed_prefix();
    for rdata in &rdatas {
        data.extend_from_slice(&owner_wire);
        data.extend_from_slice(&u16::from(rrset.rtype).to_be_bytes());
        data.extend_from_slice(&u16::from(rrset.rclass).to_be_bytes());
        data.extend_from_slice(&sig.original_ttl.to_be_bytes());
        data.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        data.extend_from_slice(rdata);
    }
    Ok(data)
}

impl RrsetVerifier for RingVerifier {
    fn validate_rrset(&self, ctx: &mut ValidationContext<'_>, rrset: &RRset) -> RrsetVerdict {
        let Some(keys) = ctx.keys else {
            return RrsetVerdict::Error(ValidationError::NoDnsKey);
        };
        let zone_name = ctx.zone_name.clone().unwrap_or_else(|| keys.name.clone());

        let signatures = Self::covering_signatures(ctx, rrset);
        if signatures.is_empty() {
            return RrsetVerdict::NoSignature;
        }

        let now = self.now(ctx);
        let mut last_err = None;
        for sig in &signatures {
            if sig.signer_name != zone_name {
                trace!("RRSIG for {} signed by {}, expected {}", rrset.name, sig.signer_name, zone_name);
                continue;
            }
            match self.verify_with_keys(rrset, sig, keys, now) {
                Ok(wildcard) => {
                    if wildcard {
                        ctx.flags.insert(ValidationFlags::WILDCARD_EXPANSION);
                    }
                    return RrsetVerdict::Secure;
                }
                Err(e) => {
                    trace!("RRSIG with key tag {} failed for {}: {}", sig.key_tag, rrset.name, e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(ValidationError::UnsupportedAlgorithm(alg)) => {
                RrsetVerdict::Error(ValidationError::UnsupportedAlgorithm(alg))
            }
            _ => RrsetVerdict::Invalid,
        }
    }

    fn dnskeys_trusted(&self, ctx: &mut ValidationContext<'_>, trust_anchor: Option<&RRset>) -> DnskeyTrust {
        let Some(keys) = ctx.keys else {
            return DnskeyTrust::Untrusted(ValidationError::NoDnsKey);
        };
        let Some(ta) = trust_anchor else {
            return DnskeyTrust::Untrusted(ValidationError::NoTrustAnchor(keys.name.clone()));
        };
        let zone_name = ctx.zone_name.clone().unwrap_or_else(|| keys.name.clone());

        let anchors: Vec<Ds> = ta.rdata().iter().filter_map(|rdata| Ds::parse(rdata).ok()).collect();
        let signatures = Self::covering_signatures(ctx, keys);
        let now = self.now(ctx);

        for rdata in keys.rdata() {
            let Ok(key) = Dnskey::parse(rdata) else {
                continue;
            };
            if !key.is_zone_key() || key.is_revoked() {
                continue;
            }
            if !anchors.iter().any(|ds| Self::ds_matches(&keys.name, rdata, &key, ds)) {
                continue;
            }

            let mut anchored = RRset::new(keys.name.clone(), DNSResourceType::DNSKEY, keys.rclass, keys.ttl);
            anchored.insert(rdata.clone());

            for sig in signatures.iter().filter(|s| s.key_tag == key.key_tag()) {
                if self.verify_with_keys(keys, sig, &anchored, now).is_err() {
                    continue;
                }
                if sig.signer_name != zone_name {
                    debug!("DNSKEY set of {} verified, but cut is {}", sig.signer_name, zone_name);
                    return DnskeyTrust::CutMismatch;
                }
                debug!("DNSKEY set of {} anchored by key tag {}", keys.name, key.key_tag());
                return DnskeyTrust::Trusted;
            }
        }

        DnskeyTrust::Untrusted(ValidationError::NoTrustedKey)
    }
}
