use std::time::{SystemTime, UNIX_EPOCH};

use bitflags::bitflags;

use super::rank::RankedRRArray;
use super::zone_cut::{CutArena, ZoneCut};
use crate::dns::DomainName;
use crate::dns::enums::DNSResourceType;

bitflags! {
    /// Per-query state flags shared with the rest of the resolver
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct QueryFlags: u32 {
        /// The answer must be DNSSEC-validated
        const DNSSEC_WANT = 1 << 0;
        /// Stub mode, validation is someone else's job
        const STUB = 1 << 1;
        /// Answer came from cache and was validated when stored
        const CACHED = 1 << 2;
        /// Proven to sit below an unsigned delegation
        const DNSSEC_INSECURE = 1 << 3;
        const DNSSEC_BOGUS = 1 << 4;
        /// Answer was synthesized from a wildcard
        const DNSSEC_WEXPAND = 1 << 5;
        /// Planner has to rediscover the zone cut
        const AWAIT_CUT = 1 << 6;
    }
}

/// Identifier of a query within its resolution plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QueryId(pub u32);

/// One query of the resolution plan
#[derive(Debug, Clone)]
pub struct Query {
    pub id: QueryId,
    pub sname: DomainName,
    pub qtype: DNSResourceType,
    pub zone_cut: ZoneCut,
    /// Query this one was spawned to serve (DS or DNSKEY lookups)
    pub parent: Option<QueryId>,
    pub flags: QueryFlags,
    /// Unix time captured when the query was created
    pub timestamp: u32,
}

impl Query {
    pub fn wants_dnssec(&self) -> bool {
        self.flags.contains(QueryFlags::DNSSEC_WANT)
    }

    /// Stop asking for validation, the zone is proven unsigned
    pub fn go_insecure(&mut self) {
        self.flags.remove(QueryFlags::DNSSEC_WANT);
        self.flags.insert(QueryFlags::DNSSEC_INSECURE);
    }
}

pub fn unix_now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

/// Ordered set of queries of one request
#[derive(Debug, Clone, Default)]
pub struct ResolutionPlan {
    queries: Vec<Query>,
}

impl ResolutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query, returning its id
    pub fn push(
        &mut self,
        sname: DomainName,
        qtype: DNSResourceType,
        zone_cut: ZoneCut,
        parent: Option<QueryId>,
        flags: QueryFlags,
    ) -> QueryId {
        let id = QueryId(self.queries.len() as u32);
        self.queries.push(Query {
            id,
            sname,
            qtype,
            zone_cut,
            parent,
            flags,
            timestamp: unix_now(),
        });
        id
    }

    pub fn get(&self, id: QueryId) -> Option<&Query> {
        self.queries.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: QueryId) -> Option<&mut Query> {
        self.queries.get_mut(id.0 as usize)
    }

    /// The query `id` together with mutable access to its parent
    pub fn with_parent_mut(&mut self, id: QueryId) -> Option<(&Query, &mut Query)> {
        let child_at = id.0 as usize;
        let parent_at = self.queries.get(child_at)?.parent?.0 as usize;
        if parent_at == child_at || parent_at >= self.queries.len() {
            return None;
        }
        if parent_at < child_at {
            let (head, tail) = self.queries.split_at_mut(child_at);
            Some((&tail[0], &mut head[parent_at]))
        } else {
            let (head, tail) = self.queries.split_at_mut(parent_at);
            Some((&head[child_at], &mut tail[0]))
        }
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// A resolution request: the plan, the query being processed and the
/// selected answer
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub plan: ResolutionPlan,
    pub current: QueryId,
    pub answer_selected: RankedRRArray,
    pub auth_selected: RankedRRArray,
    pub cuts: CutArena,
}

impl Request {
    pub fn new(plan: ResolutionPlan, current: QueryId) -> Self {
        Self {
            plan,
            current,
            ..Default::default()
        }
    }

    pub fn current_query(&self) -> Option<&Query> {
        self.plan.get(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_child() -> (ResolutionPlan, QueryId, QueryId) {
        let mut plan = ResolutionPlan::new();
        let zone: DomainName = "example.com".parse().unwrap();
        let parent = plan.push(
            "www.example.com".parse().unwrap(),
            DNSResourceType::A,
            ZoneCut::new(zone.clone()),
            None,
            QueryFlags::DNSSEC_WANT,
        );
        let child = plan.push(
            zone.clone(),
            DNSResourceType::DS,
            ZoneCut::new(zone),
            Some(parent),
            QueryFlags::DNSSEC_WANT,
        );
        (plan, parent, child)
    }

    #[test]
    fn test_with_parent_mut() {
        let (mut plan, parent, child) = plan_with_child();
        let (c, p) = plan.with_parent_mut(child).unwrap();
        assert_eq!(c.id, child);
        assert_eq!(p.id, parent);
        p.go_insecure();

        let p = plan.get(parent).unwrap();
        assert!(!p.wants_dnssec());
        assert!(p.flags.contains(QueryFlags::DNSSEC_INSECURE));

        assert!(plan.with_parent_mut(parent).is_none());
        assert!(plan.with_parent_mut(QueryId(9)).is_none());
    }

    #[test]
    fn test_timestamp_captured() {
        let (plan, parent, _) = plan_with_child();
        assert!(plan.get(parent).unwrap().timestamp > 0);
    }
}
