//! Ranked record arrays.
//!
//! Every RRset selected for the final answer or authority section carries a
//! validation rank. The validator only ever moves a rank forward from
//! `Initial`; once an entry is `Secure` it is never examined again.

use super::query::QueryId;
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, RRset, Section};

/// Validation rank of a selected RRset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rank {
    /// Not examined yet
    #[default]
    Initial,
    Secure,
    /// Unsigned
    Insecure,
    /// Signature present but invalid
    Bogus,
    /// RRSIG whose signer differs from the current zone cut
    Mismatch,
    /// Verification could not run
    Unknown,
}

/// One selected RRset with its rank and bookkeeping flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub rrset: RRset,
    pub rank: Rank,
    /// Set by the planner when the owning query was suspended; the
    /// validator skips such entries
    pub yielded: bool,
    /// Whether the entry goes into the final wire answer
    pub to_wire: bool,
    /// Query that selected this entry
    pub query: QueryId,
}

impl RankedEntry {
    pub fn new(rrset: RRset, query: QueryId) -> Self {
        Self {
            rrset,
            rank: Rank::Initial,
            yielded: false,
            to_wire: false,
            query,
        }
    }

    pub fn is_rrsig(&self) -> bool {
        self.rrset.rtype == DNSResourceType::RRSIG
    }

    /// Entries the validator still has to look at
    pub fn is_pending(&self) -> bool {
        !self.yielded && self.rank != Rank::Secure
    }
}

/// Ordered list of ranked RRsets for one section of the final answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedRRArray {
    entries: Vec<RankedEntry>,
}

impl RankedRRArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: RankedEntry) {
        self.entries.push(entry);
    }

    /// Select every RRset of a packet section for `query`
    pub fn select_section(&mut self, packet: &DNSPacket, section: Section, query: QueryId) {
        for rrset in RRset::group(packet.section(section)) {
            self.entries.push(RankedEntry::new(rrset, query));
        }
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [RankedEntry] {
        &mut self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark every entry selected by `query` as belonging to a suspended query
    pub fn mark_yielded(&mut self, query: QueryId) {
        for entry in self.entries.iter_mut().filter(|e| e.query == query) {
            entry.yielded = true;
        }
    }

    /// Set the wire flag on every entry selected by `query`
    pub fn set_wire(&mut self, to_wire: bool, query: QueryId) {
        for entry in self.entries.iter_mut().filter(|e| e.query == query) {
            entry.to_wire = to_wire;
        }
    }

    /// Signer of the first RRSIG entry that is neither yielded nor ranked yet
    pub fn first_signer(&self) -> Option<crate::dns::DomainName> {
        self.entries
            .iter()
            .filter(|e| !e.yielded && e.rank == Rank::Initial && e.is_rrsig())
            .find_map(|e| e.rrset.rrsig_signer(0))
    }
}
