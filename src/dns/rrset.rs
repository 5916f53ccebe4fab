use rustc_hash::FxHashMap;

use super::{
    DomainName,
    enums::{DNSResourceClass, DNSResourceType},
    rdata::{Rrsig, into_canonical},
    resource::DNSResource,
};

/// A set of records sharing owner, type and class.
///
/// RDATA is stored in canonical form (RFC 4034 section 6.2), sorted and free
/// of duplicates, which is both the canonical RR ordering of section 6.3 and
/// the set semantics merges rely on. RRSIG sets additionally share the
/// covered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RRset {
    pub name: DomainName,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    rdata: Vec<Vec<u8>>,
}

impl RRset {
    pub fn new(name: DomainName, rtype: DNSResourceType, rclass: DNSResourceClass, ttl: u32) -> Self {
        Self {
            name,
            rtype,
            rclass,
            ttl,
            rdata: Vec::new(),
        }
    }

    pub fn from_record(record: &DNSResource) -> Self {
        let mut rrset = Self::new(record.name.clone(), record.rtype, record.rclass, record.ttl);
        rrset.insert(record.rdata.clone());
        rrset
    }

    /// Add one RDATA, returning false if it was already present
    pub fn insert(&mut self, rdata: Vec<u8>) -> bool {
        let rdata = into_canonical(self.rtype, rdata);
        match self.rdata.binary_search(&rdata) {
            Ok(_) => false,
            Err(at) => {
                self.rdata.insert(at, rdata);
                true
            }
        }
    }

    /// Whether `record` belongs in this set
    pub fn accepts(&self, record: &DNSResource) -> bool {
        record.name == self.name
            && record.rtype == self.rtype
            && record.rclass == self.rclass
            && (self.rtype != DNSResourceType::RRSIG
                || record.covered_type() == self.covered_type())
    }

    /// Union of two sets with the same owner, type and class, built into a
    /// new set. `None` if the sets are not compatible.
    pub fn union(&self, other: &RRset) -> Option<RRset> {
        if self.name != other.name || self.rtype != other.rtype || self.rclass != other.rclass {
            return None;
        }
        let mut merged = self.clone();
        merged.ttl = merged.ttl.min(other.ttl);
        for rdata in &other.rdata {
            merged.insert(rdata.clone());
        }
        Some(merged)
    }

    pub fn rdata(&self) -> &[Vec<u8>] {
        &self.rdata
    }

    pub fn len(&self) -> usize {
        self.rdata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rdata.is_empty()
    }

    /// Individual records of this set
    pub fn records(&self) -> impl Iterator<Item = DNSResource> + '_ {
        self.rdata.iter().map(|rdata| {
            DNSResource::new(
                self.name.clone(),
                self.rtype,
                self.rclass,
                self.ttl,
                rdata.clone(),
            )
        })
    }

    /// Type covered by an RRSIG set (taken from its first record)
    pub fn covered_type(&self) -> Option<DNSResourceType> {
        if self.rtype != DNSResourceType::RRSIG {
            return None;
        }
        let first = self.rdata.first()?;
        (first.len() >= 2).then(|| u16::from_be_bytes([first[0], first[1]]).into())
    }

    /// Signer name of the RRSIG at `index`
    pub fn rrsig_signer(&self, index: usize) -> Option<DomainName> {
        if self.rtype != DNSResourceType::RRSIG {
            return None;
        }
        let rdata = self.rdata.get(index)?;
        Rrsig::parse(rdata).ok().map(|sig| sig.signer_name)
    }

    /// Group a packet section into RRsets, preserving first-seen order
    pub fn group(records: &[DNSResource]) -> Vec<RRset> {
        type Key = (DomainName, DNSResourceType, u16, Option<DNSResourceType>);

        let mut index: FxHashMap<Key, usize> = FxHashMap::default();
        let mut sets: Vec<RRset> = Vec::new();

        for record in records {
            let key = (
                record.name.clone(),
                record.rtype,
                u16::from(record.rclass),
                record.covered_type(),
            );
            match index.get(&key) {
                Some(&at) => {
                    let set = &mut sets[at];
                    set.ttl = set.ttl.min(record.ttl);
                    set.insert(record.rdata.clone());
                }
                None => {
                    index.insert(key, sets.len());
                    sets.push(RRset::from_record(record));
                }
            }
        }

        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::rdata::Ds;

    fn ds_record(tag: u16) -> DNSResource {
        let ds = Ds {
            key_tag: tag,
            algorithm: 8,
            digest_type: 2,
            digest: vec![tag as u8; 32],
        };
        DNSResource::new(
            "example.com".parse().unwrap(),
            DNSResourceType::DS,
            DNSResourceClass::IN,
            86400,
            ds.to_rdata(),
        )
    }

    #[test]
    fn test_union_is_order_independent() {
        let a = RRset::from_record(&ds_record(1));
        let b = RRset::from_record(&ds_record(2));
        let c = RRset::from_record(&ds_record(3));

        let abc = a.union(&b).and_then(|s| s.union(&c)).unwrap();
        let cba = c.union(&b).and_then(|s| s.union(&a)).unwrap();
        assert_eq!(abc, cba);
        assert_eq!(abc.len(), 3);

        // duplicates collapse
        assert_eq!(abc.union(&a).unwrap().len(), 3);
    }

    #[test]
    fn test_union_rejects_other_owner() {
        let a = RRset::from_record(&ds_record(1));
        let mut other = ds_record(2);
        other.name = "example.net".parse().unwrap();
        assert!(a.union(&RRset::from_record(&other)).is_none());
    }

    #[test]
    fn test_group_keeps_rrsig_covered_types_apart() {
        let owner: DomainName = "www.example.com".parse().unwrap();
        let sig = |covered: u16| {
            let mut rdata = covered.to_be_bytes().to_vec();
            rdata.extend_from_slice(&[15, 3, 0, 0, 0, 60]);
            rdata.extend_from_slice(&[0; 10]);
            rdata.extend_from_slice(&"example.com".parse::<DomainName>().unwrap().to_wire());
            DNSResource::new(owner.clone(), DNSResourceType::RRSIG, DNSResourceClass::IN, 60, rdata)
        };
        let a = DNSResource::new(owner.clone(), DNSResourceType::A, DNSResourceClass::IN, 60, vec![192, 0, 2, 1]);

        let sets = RRset::group(&[a.clone(), sig(1), sig(28), a]);
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].rtype, DNSResourceType::A);
        assert_eq!(sets[0].len(), 1);
        assert_eq!(sets[1].covered_type(), Some(DNSResourceType::A));
        assert_eq!(sets[2].covered_type(), Some(DNSResourceType::AAAA));
        assert_eq!(
            sets[1].rrsig_signer(0).map(|n| n.to_string()),
            Some("example.com.".to_string())
        );
    }

    #[test]
    fn test_embedded_names_compare_case_insensitively() {
        let owner: DomainName = "www.example.com".parse().unwrap();
        let cname = |target: &[u8]| {
            DNSResource::new(owner.clone(), DNSResourceType::CNAME, DNSResourceClass::IN, 300, target.to_vec())
        };
        let mixed = cname(b"\x06Target\x07Example\x03COM\x00");
        let lower = cname(b"\x06target\x07example\x03com\x00");

        let mut set = RRset::from_record(&mixed);
        assert!(!set.insert(lower.rdata.clone()));
        assert_eq!(set.rdata(), &[lower.rdata]);
    }
}
