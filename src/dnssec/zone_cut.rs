//! Zone cuts and the arena that owns their ancestry.
//!
//! A query's active cut is stored inline in the query. Ancestor cuts live in
//! a per-request [`CutArena`] and are referenced by index, so descending to a
//! new cut means pushing a copy of the current one and pointing `parent` at
//! it.

use crate::dns::enums::DNSResourceType;
use crate::dns::{DomainName, RRset};

/// Index of a cut in a [`CutArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CutId(pub usize);

/// A zone cut with the key material trusted for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCut {
    pub name: DomainName,
    /// DNSKEY RRset of the zone
    pub key: Option<RRset>,
    /// DS RRset vouching for the zone's keys
    pub trust_anchor: Option<RRset>,
    pub parent: Option<CutId>,
}

impl ZoneCut {
    pub fn new(name: DomainName) -> Self {
        Self {
            name,
            key: None,
            trust_anchor: None,
            parent: None,
        }
    }

    /// Reinitialize at `name`, dropping key material and ancestry
    pub fn init(&mut self, name: DomainName) {
        *self = Self::new(name);
    }

    pub fn with_key(mut self, key: RRset) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_trust_anchor(mut self, ta: RRset) -> Self {
        self.trust_anchor = Some(ta);
        self
    }

    /// Copy key and trust anchor from another cut
    pub fn copy_trust_from(&mut self, other: &ZoneCut) {
        self.key = other.key.clone();
        self.trust_anchor = other.trust_anchor.clone();
    }

    pub fn key_owner(&self) -> Option<&DomainName> {
        self.key.as_ref().map(|k| &k.name)
    }

    pub fn trust_anchor_owner(&self) -> Option<&DomainName> {
        self.trust_anchor.as_ref().map(|ta| &ta.name)
    }

    /// Key material of the given kind, as handed to parent queries
    pub fn material(&self, rtype: DNSResourceType) -> Option<&RRset> {
        match rtype {
            DNSResourceType::DNSKEY => self.key.as_ref(),
            DNSResourceType::DS => self.trust_anchor.as_ref(),
            _ => None,
        }
    }
}

/// Per-request storage of ancestor cuts
#[derive(Debug, Clone, Default)]
pub struct CutArena {
    cuts: Vec<ZoneCut>,
}

impl CutArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, cut: ZoneCut) -> CutId {
        self.cuts.push(cut);
        CutId(self.cuts.len() - 1)
    }

    pub fn get(&self, id: CutId) -> Option<&ZoneCut> {
        self.cuts.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// Walk the ancestor chain starting at `start`
    pub fn ancestors(&self, start: Option<CutId>) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            next: start,
            remaining: self.cuts.len(),
        }
    }

    /// First cut on the chain from `start` named `name`
    pub fn find(&self, start: Option<CutId>, name: &DomainName) -> Option<(CutId, &ZoneCut)> {
        self.ancestors(start).find(|(_, cut)| &cut.name == name)
    }
}

/// Iterator over an ancestor chain. Bounded by the arena size so a
/// malformed chain cannot loop.
pub struct Ancestors<'a> {
    arena: &'a CutArena,
    next: Option<CutId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (CutId, &'a ZoneCut);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.next?;
        let cut = self.arena.get(id)?;
        self.remaining -= 1;
        self.next = cut.parent;
        Some((id, cut))
    }
}
