pub mod edns;
pub mod enums;
pub mod header;
pub mod name;
pub mod question;
pub mod rdata;
pub mod resource;
pub mod rrset;

use edns::EdnsOpt;
use enums::{DNSResourceType, ResponseCode};
use header::DNSHeader;
use question::DNSQuestion;
use resource::DNSResource;

pub use name::DomainName;
pub use rrset::RRset;

/// A decoded DNS message as seen by the validator.
///
/// Wire decoding happens upstream; the validator only reads sections,
/// header bits and the EDNS DO flag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSPacket {
    pub header: DNSHeader,
    pub questions: Vec<DNSQuestion>,
    pub answers: Vec<DNSResource>,
    pub authorities: Vec<DNSResource>,
    pub resources: Vec<DNSResource>,
    /// EDNS0 OPT record if present (extracted from additional records)
    pub edns: Option<EdnsOpt>,
}

/// Packet section selector
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid DNS label")]
    InvalidLabel,
    #[error("DNS name too long")]
    NameTooLong,
    #[error("Compression pointer not allowed in RDATA name")]
    CompressedName,
    #[error("Truncated {0} RDATA")]
    TruncatedRdata(&'static str),
    #[error("Invalid type bitmap")]
    InvalidTypeBitmap,
}

impl DNSPacket {
    /// Records of the given section
    pub fn section(&self, section: Section) -> &[DNSResource] {
        match section {
            Section::Answer => &self.answers,
            Section::Authority => &self.authorities,
            Section::Additional => &self.resources,
        }
    }

    /// Name of the first question, root if the question section is empty
    pub fn qname(&self) -> DomainName {
        self.questions
            .first()
            .map(|q| q.name.clone())
            .unwrap_or_else(DomainName::root)
    }

    /// Type of the first question
    pub fn qtype(&self) -> Option<DNSResourceType> {
        self.questions.first().map(|q| q.qtype)
    }

    pub fn rcode(&self) -> ResponseCode {
        ResponseCode::from_u8(self.header.rcode)
    }

    /// Authoritative answer bit
    pub fn is_authoritative(&self) -> bool {
        self.header.aa
    }

    /// Check if DNSSEC is requested (DO flag)
    pub fn dnssec_requested(&self) -> bool {
        self.edns.as_ref().map(|edns| edns.do_flag()).unwrap_or(false)
    }

    /// Add or update EDNS support in the packet
    pub fn add_edns(&mut self, payload_size: u16, do_flag: bool) {
        let mut edns = EdnsOpt::with_payload_size(payload_size);
        edns.set_do_flag(do_flag);
        self.edns = Some(edns);
    }

    pub fn section_has_type(&self, section: Section, rtype: DNSResourceType) -> bool {
        self.section(section).iter().any(|rr| rr.rtype == rtype)
    }

    /// Search answer, authority and additional sections for a record type
    pub fn has_type(&self, rtype: DNSResourceType) -> bool {
        [Section::Answer, Section::Authority, Section::Additional]
            .into_iter()
            .any(|section| self.section_has_type(section, rtype))
    }
}
