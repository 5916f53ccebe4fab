use super::{
    DomainName,
    enums::{DNSResourceClass, DNSResourceType},
    rdata::Rrsig,
};

/// One resource record in a packet section
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSResource {
    pub name: DomainName,
    pub rtype: DNSResourceType,
    pub rclass: DNSResourceClass,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl DNSResource {
    pub fn new(
        name: DomainName,
        rtype: DNSResourceType,
        rclass: DNSResourceClass,
        ttl: u32,
        rdata: Vec<u8>,
    ) -> Self {
        Self {
            name,
            rtype,
            rclass,
            ttl,
            rdata,
        }
    }

    /// Type covered by an RRSIG record, `None` for other types or short RDATA
    pub fn covered_type(&self) -> Option<DNSResourceType> {
        if self.rtype != DNSResourceType::RRSIG || self.rdata.len() < 2 {
            return None;
        }
        Some(u16::from_be_bytes([self.rdata[0], self.rdata[1]]).into())
    }

    /// Decoded RRSIG RDATA if this is a well-formed RRSIG
    pub fn rrsig(&self) -> Option<Rrsig> {
        if self.rtype != DNSResourceType::RRSIG {
            return None;
        }
        Rrsig::parse(&self.rdata).ok()
    }
}
