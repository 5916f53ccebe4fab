//! Common test utilities for the validator tests
//!
//! Packet builders, an Ed25519 zone signer backed by ring, and scripted
//! stand-ins for the verifier and denial checker seams.

#![allow(dead_code)] // These functions are used by various test files

use std::sync::Mutex;

use heimdall_validator::{
    dns::{
        DNSPacket, DomainName, RRset, Section,
        enums::{DNSResourceClass, DNSResourceType, ResponseCode},
        question::DNSQuestion,
        rdata::{Dnskey, Ds, Nsec, Nsec3, Rrsig, TypeBitmap},
        resource::DNSResource,
    },
    dnssec::{
        DenialChecker, DenialError, DigestType, DnskeyTrust, QueryFlags, Request,
        ResolutionPlan, RrsetVerdict, RrsetVerifier, ValidationContext, ValidationFlags, ZoneCut,
        crypto::signed_data,
        denial::{encode_hash, nsec3_hash},
    },
};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};

/// Validation time used by every signed fixture
pub const NOW: u32 = 1_700_000_000;
pub const INCEPTION: u32 = NOW - 3600;
pub const EXPIRATION: u32 = NOW + 86_400;

pub fn name(s: &str) -> DomainName {
    s.parse().expect("valid test name")
}

pub fn record(owner: &str, rtype: DNSResourceType, rdata: Vec<u8>) -> DNSResource {
    DNSResource::new(name(owner), rtype, DNSResourceClass::IN, 3600, rdata)
}

pub fn a_record(owner: &str, addr: [u8; 4]) -> DNSResource {
    record(owner, DNSResourceType::A, addr.to_vec())
}

pub fn ns_record(owner: &str, target: &str) -> DNSResource {
    record(owner, DNSResourceType::NS, name(target).to_wire())
}

pub fn soa_record(zone: &str) -> DNSResource {
    let mut rdata = name(&format!("ns1.{}", zone)).to_wire();
    rdata.extend(name(&format!("hostmaster.{}", zone)).to_wire());
    for value in [2024010101u32, 7200, 3600, 1_209_600, 300] {
        rdata.extend_from_slice(&value.to_be_bytes());
    }
    record(zone, DNSResourceType::SOA, rdata)
}

pub fn nsec_record(owner: &str, next: &str, types: &[DNSResourceType]) -> DNSResource {
    let nsec = Nsec {
        next_name: name(next),
        types: TypeBitmap::from_types(types.iter().copied()),
    };
    record(owner, DNSResourceType::NSEC, nsec.to_rdata())
}

/// RRSIG with a fake signature, good enough for signer checks and scripted
/// verifiers
pub fn fake_rrsig(owner: &str, covered: DNSResourceType, signer: &str) -> DNSResource {
    let sig = Rrsig {
        type_covered: covered,
        algorithm: 15,
        labels: name(owner).label_count() as u8,
        original_ttl: 3600,
        sig_expiration: EXPIRATION,
        sig_inception: INCEPTION,
        key_tag: 4242,
        signer_name: name(signer),
        signature: vec![0x5A; 64],
    };
    record(owner, DNSResourceType::RRSIG, sig.to_rdata())
}

/// Response to `qname`/`qtype` with the DO bit set
pub fn response(qname: &str, qtype: DNSResourceType, authoritative: bool) -> DNSPacket {
    let mut packet = DNSPacket::default();
    packet.header.qr = true;
    packet.header.aa = authoritative;
    packet.questions.push(DNSQuestion::new(name(qname), qtype));
    packet.add_edns(4096, true);
    packet
}

pub fn nxdomain(qname: &str, qtype: DNSResourceType) -> DNSPacket {
    let mut packet = response(qname, qtype, true);
    packet.header.rcode = ResponseCode::NameError.to_u8();
    packet
}

/// Fake DNSKEY set, only its owner matters to scripted verifiers
pub fn fake_keys(zone: &str) -> RRset {
    let key = Dnskey {
        flags: 257,
        protocol: 3,
        algorithm: 15,
        public_key: vec![0x11; 32],
    };
    RRset::from_record(&record(zone, DNSResourceType::DNSKEY, key.to_rdata()))
}

pub fn fake_ds(zone: &str) -> RRset {
    let ds = Ds {
        key_tag: 4242,
        algorithm: 15,
        digest_type: 2,
        digest: vec![0x22; 32],
    };
    RRset::from_record(&record(zone, DNSResourceType::DS, ds.to_rdata()))
}

/// Zone cut with fake keys and trust anchor
pub fn keyed_cut(zone: &str) -> ZoneCut {
    ZoneCut::new(name(zone))
        .with_key(fake_keys(zone))
        .with_trust_anchor(fake_ds(zone))
}

/// Request with a single top-level query
pub fn single_query(sname: &str, qtype: DNSResourceType, cut: ZoneCut, flags: QueryFlags) -> Request {
    let mut plan = ResolutionPlan::new();
    let id = plan.push(name(sname), qtype, cut, None, flags);
    Request::new(plan, id)
}

/// Select the answer and authority sections of `packet` for the current query
pub fn select(req: &mut Request, packet: &DNSPacket) {
    let current = req.current;
    req.answer_selected.select_section(packet, Section::Answer, current);
    req.auth_selected.select_section(packet, Section::Authority, current);
}

/// Ed25519 signing key of one zone
pub struct ZoneSigner {
    pub zone: DomainName,
    key_pair: Ed25519KeyPair,
}

impl ZoneSigner {
    pub fn new(zone: &str) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).expect("key generation");
        let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).expect("valid pkcs8");
        Self {
            zone: name(zone),
            key_pair,
        }
    }

    pub fn dnskey(&self) -> Dnskey {
        Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: 15,
            public_key: self.key_pair.public_key().as_ref().to_vec(),
        }
    }

    pub fn dnskey_record(&self) -> DNSResource {
        DNSResource::new(
            self.zone.clone(),
            DNSResourceType::DNSKEY,
            DNSResourceClass::IN,
            3600,
            self.dnskey().to_rdata(),
        )
    }

    pub fn keys(&self) -> RRset {
        RRset::from_record(&self.dnskey_record())
    }

    /// SHA-256 DS record vouching for this key
    pub fn ds_record(&self) -> DNSResource {
        let rdata = self.dnskey().to_rdata();
        let ds = Ds {
            key_tag: self.dnskey().key_tag(),
            algorithm: 15,
            digest_type: 2,
            digest: DigestType::Sha256
                .dnskey_digest(&self.zone, &rdata)
                .expect("sha256 supported"),
        };
        DNSResource::new(
            self.zone.clone(),
            DNSResourceType::DS,
            DNSResourceClass::IN,
            3600,
            ds.to_rdata(),
        )
    }

    pub fn trust_anchor(&self) -> RRset {
        RRset::from_record(&self.ds_record())
    }

    /// Sign the records (one RRset) with the given label count
    pub fn sign_with_labels(&self, records: &[DNSResource], labels: u8, inception: u32, expiration: u32) -> DNSResource {
        let rrset = RRset::group(records)
            .into_iter()
            .next()
            .expect("at least one record");
        let mut sig = Rrsig {
            type_covered: rrset.rtype,
            algorithm: 15,
            labels,
            original_ttl: rrset.ttl,
            sig_expiration: expiration,
            sig_inception: inception,
            key_tag: self.dnskey().key_tag(),
            signer_name: self.zone.clone(),
            signature: Vec::new(),
        };
        let data = signed_data(&rrset, &sig).expect("signed data");
        sig.signature = self.key_pair.sign(&data).as_ref().to_vec();
        DNSResource::new(
            rrset.name.clone(),
            DNSResourceType::RRSIG,
            rrset.rclass,
            rrset.ttl,
            sig.to_rdata(),
        )
    }

    pub fn sign(&self, records: &[DNSResource]) -> DNSResource {
        let labels = records[0].name.label_count() as u8;
        self.sign_with_labels(records, labels, INCEPTION, EXPIRATION)
    }
}

/// Verifier with scripted answers. RRsets listed in `verdicts` get their
/// verdict, everything else is secure.
pub struct ScriptedVerifier {
    pub verdicts: Vec<(DomainName, DNSResourceType, RrsetVerdict)>,
    pub trust: DnskeyTrust,
    /// Report wildcard expansion for answer section RRsets
    pub wildcard: bool,
    pub calls: Mutex<Vec<(DomainName, DNSResourceType)>>,
}

impl ScriptedVerifier {
    pub fn secure() -> Self {
        Self {
            verdicts: Vec::new(),
            trust: DnskeyTrust::Trusted,
            wildcard: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_verdict(mut self, owner: &str, rtype: DNSResourceType, verdict: RrsetVerdict) -> Self {
        self.verdicts.push((name(owner), rtype, verdict));
        self
    }

    pub fn with_trust(mut self, trust: DnskeyTrust) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_wildcard(mut self) -> Self {
        self.wildcard = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl RrsetVerifier for ScriptedVerifier {
    fn validate_rrset(&self, ctx: &mut ValidationContext<'_>, rrset: &RRset) -> RrsetVerdict {
        self.calls
            .lock()
            .unwrap()
            .push((rrset.name.clone(), rrset.rtype));
        if self.wildcard && ctx.section == Section::Answer {
            ctx.flags.insert(ValidationFlags::WILDCARD_EXPANSION);
        }
        self.verdicts
            .iter()
            .find(|(owner, rtype, _)| *owner == rrset.name && *rtype == rrset.rtype)
            .map(|(_, _, verdict)| verdict.clone())
            .unwrap_or(RrsetVerdict::Secure)
    }

    fn dnskeys_trusted(&self, _ctx: &mut ValidationContext<'_>, _trust_anchor: Option<&RRset>) -> DnskeyTrust {
        self.trust.clone()
    }
}

/// Denial checker answering every proof with the same result
pub struct ScriptedDenial {
    pub result: Result<(), DenialError>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl ScriptedDenial {
    pub fn proving() -> Self {
        Self::with_result(Ok(()))
    }

    pub fn with_result(result: Result<(), DenialError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn answer(&self, call: &'static str) -> Result<(), DenialError> {
        self.calls.lock().unwrap().push(call);
        self.result.clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl DenialChecker for ScriptedDenial {
    fn nsec_name_error(&self, _: &DNSPacket, _: Section, _: &DomainName) -> Result<(), DenialError> {
        self.answer("nsec_name_error")
    }

    fn nsec_existence_denial(
        &self,
        _: &DNSPacket,
        _: Section,
        _: &DomainName,
        _: DNSResourceType,
    ) -> Result<(), DenialError> {
        self.answer("nsec_existence_denial")
    }

    fn nsec_ref_to_unsigned(&self, _: &DNSPacket) -> Result<(), DenialError> {
        self.answer("nsec_ref_to_unsigned")
    }

    fn nsec3_name_error(&self, _: &DNSPacket, _: Section, _: &DomainName) -> Result<(), DenialError> {
        self.answer("nsec3_name_error")
    }

    fn nsec3_no_data(
        &self,
        _: &DNSPacket,
        _: Section,
        _: &DomainName,
        _: DNSResourceType,
    ) -> Result<(), DenialError> {
        self.answer("nsec3_no_data")
    }

    fn nsec3_ref_to_unsigned(&self, _: &DNSPacket) -> Result<(), DenialError> {
        self.answer("nsec3_ref_to_unsigned")
    }
}

/// Parameters of a synthetic NSEC3 chain
pub struct Nsec3Params {
    pub salt: Vec<u8>,
    pub iterations: u16,
    pub opt_out: bool,
}

impl Default for Nsec3Params {
    fn default() -> Self {
        Self {
            salt: vec![0xAA, 0xBB, 0xCC, 0xDD],
            iterations: 12,
            opt_out: false,
        }
    }
}

/// Complete NSEC3 chain for `zone` over the given names and their types
pub fn nsec3_chain(zone: &str, names: &[(&str, &[DNSResourceType])], params: &Nsec3Params) -> Vec<DNSResource> {
    let zone = name(zone);
    let mut hashed: Vec<(Vec<u8>, &[DNSResourceType])> = names
        .iter()
        .map(|(owner, types)| (nsec3_hash(&name(owner), &params.salt, params.iterations), *types))
        .collect();
    hashed.sort_by(|a, b| a.0.cmp(&b.0));

    (0..hashed.len())
        .map(|i| {
            let (hash, types) = &hashed[i];
            let next = &hashed[(i + 1) % hashed.len()].0;
            let nsec3 = Nsec3 {
                hash_algorithm: 1,
                flags: u8::from(params.opt_out),
                iterations: params.iterations,
                salt: params.salt.clone(),
                next_hashed_owner: next.clone(),
                types: TypeBitmap::from_types(types.iter().copied()),
            };
            let owner = zone.prepend(&encode_hash(hash)).expect("hash label fits");
            DNSResource::new(owner, DNSResourceType::NSEC3, DNSResourceClass::IN, 3600, nsec3.to_rdata())
        })
        .collect()
}
