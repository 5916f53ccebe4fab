use tracing::{debug, warn};

use super::errors::{Result, ValidationError};
use super::query::{Query, QueryFlags};
use super::verifier::{DnskeyTrust, RrsetVerifier, ValidationContext, ValidationFlags};
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, RRset, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeysetUpdate {
    /// Keys accepted (or nothing new arrived)
    Accepted { wildcard_expanded: bool },
    /// Keys verify but for another cut, retry after the cut is fixed
    CutMismatch,
}

/// Merge answer DNSKEYs at or below the active cut into its key set and,
/// unless the answer is cached, require the result to be anchored by the
/// cut's DS set.
///
/// The merged set is built on the side and only installed once trusted; a
/// rejected set leaves the previous keys untouched.
pub fn update_keyset(
    qry: &mut Query,
    packet: &DNSPacket,
    has_nsec3: bool,
    verifier: &dyn RrsetVerifier,
) -> Result<KeysetUpdate> {
    let cut_name = qry.zone_cut.name.clone();
    let mut merged = qry.zone_cut.key.clone();
    let mut updated = false;

    for rrset in RRset::group(&packet.answers) {
        if rrset.rtype != DNSResourceType::DNSKEY || !rrset.name.is_at_or_below(&cut_name) {
            continue;
        }
        merged = match merged {
            Some(current) if current.name == rrset.name => current.union(&rrset).or(Some(current)),
            _ => Some(rrset),
        };
        updated = true;
    }

    if !updated {
        return Ok(KeysetUpdate::Accepted {
            wildcard_expanded: false,
        });
    }

    let mut wildcard_expanded = false;
    if !qry.flags.contains(QueryFlags::CACHED) {
        let mut ctx = ValidationContext::new(packet, Section::Answer, qry.timestamp);
        ctx.keys = merged.as_ref();
        ctx.zone_name = Some(cut_name.clone());
        ctx.has_nsec3 = has_nsec3;

        match verifier.dnskeys_trusted(&mut ctx, qry.zone_cut.trust_anchor.as_ref()) {
            DnskeyTrust::Trusted => {
                wildcard_expanded = ctx.flags.contains(ValidationFlags::WILDCARD_EXPANSION);
            }
            DnskeyTrust::CutMismatch => {
                debug!("DNSKEY set for {} belongs to another cut", cut_name);
                return Ok(KeysetUpdate::CutMismatch);
            }
            DnskeyTrust::Untrusted(e) => {
                warn!("Bad keys for {}, broken trust chain: {}", cut_name, e);
                return Err(ValidationError::BrokenTrustChain(Box::new(e)));
            }
        }
    }

    debug!(
        "Installed {} DNSKEY records for {}",
        merged.as_ref().map(RRset::len).unwrap_or(0),
        cut_name
    );
    qry.zone_cut.key = merged;
    Ok(KeysetUpdate::Accepted { wildcard_expanded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::DomainName;
    use crate::dns::enums::DNSResourceClass;
    use crate::dns::resource::DNSResource;
    use crate::dnssec::query::{QueryId, unix_now};
    use crate::dnssec::verifier::RrsetVerdict;
    use crate::dnssec::zone_cut::ZoneCut;

    struct Trust(DnskeyTrust);

    impl RrsetVerifier for Trust {
        fn validate_rrset(&self, _: &mut ValidationContext<'_>, _: &RRset) -> RrsetVerdict {
            RrsetVerdict::Secure
        }

        fn dnskeys_trusted(&self, ctx: &mut ValidationContext<'_>, _: Option<&RRset>) -> DnskeyTrust {
            assert!(ctx.keys.is_some());
            self.0.clone()
        }
    }

    fn name(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    fn dnskey(owner: &str, key: u8) -> DNSResource {
        DNSResource::new(name(owner), DNSResourceType::DNSKEY, DNSResourceClass::IN, 3600, vec![1, 0, 3, 15, key])
    }

    fn query(flags: QueryFlags, key: Option<RRset>) -> Query {
        let mut cut = ZoneCut::new(name("example.com"));
        cut.key = key;
        Query {
            id: QueryId(0),
            sname: name("example.com"),
            qtype: DNSResourceType::DNSKEY,
            zone_cut: cut,
            parent: None,
            flags,
            timestamp: unix_now(),
        }
    }

    #[test]
    fn test_merge_same_owner() {
        let existing = RRset::from_record(&dnskey("example.com", 1));
        let mut qry = query(QueryFlags::DNSSEC_WANT, Some(existing));
        let mut packet = DNSPacket::default();
        packet.answers.push(dnskey("example.com", 2));

        let update = update_keyset(&mut qry, &packet, false, &Trust(DnskeyTrust::Trusted)).unwrap();
        assert_eq!(update, KeysetUpdate::Accepted { wildcard_expanded: false });
        assert_eq!(qry.zone_cut.key.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_replace_other_owner_and_ignore_outside_cut() {
        let existing = RRset::from_record(&dnskey("example.com", 1));
        let mut qry = query(QueryFlags::DNSSEC_WANT, Some(existing));
        let mut packet = DNSPacket::default();
        packet.answers.push(dnskey("sub.example.com", 2));
        packet.answers.push(dnskey("example.net", 3));

        update_keyset(&mut qry, &packet, false, &Trust(DnskeyTrust::Trusted)).unwrap();
        let key = qry.zone_cut.key.unwrap();
        assert_eq!(key.name, name("sub.example.com"));
        assert_eq!(key.len(), 1);
    }

    #[test]
    fn test_untrusted_keys_leave_cut_untouched() {
        let existing = RRset::from_record(&dnskey("example.com", 1));
        let mut qry = query(QueryFlags::DNSSEC_WANT, Some(existing.clone()));
        let mut packet = DNSPacket::default();
        packet.answers.push(dnskey("example.com", 2));

        let err = update_keyset(
            &mut qry,
            &packet,
            false,
            &Trust(DnskeyTrust::Untrusted(ValidationError::NoTrustedKey)),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::BrokenTrustChain(_)));
        assert_eq!(qry.zone_cut.key, Some(existing.clone()));

        let update =
            update_keyset(&mut qry, &packet, false, &Trust(DnskeyTrust::CutMismatch)).unwrap();
        assert_eq!(update, KeysetUpdate::CutMismatch);
        assert_eq!(qry.zone_cut.key, Some(existing));
    }

    #[test]
    fn test_cached_keys_are_not_reverified() {
        let mut qry = query(QueryFlags::DNSSEC_WANT | QueryFlags::CACHED, None);
        let mut packet = DNSPacket::default();
        packet.answers.push(dnskey("example.com", 2));

        let update = update_keyset(
            &mut qry,
            &packet,
            false,
            &Trust(DnskeyTrust::Untrusted(ValidationError::NoTrustedKey)),
        )
        .unwrap();
        assert_eq!(update, KeysetUpdate::Accepted { wildcard_expanded: false });
        assert!(qry.zone_cut.key.is_some());
    }
}
