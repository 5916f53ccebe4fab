use super::{
    DomainName,
    enums::{DNSResourceClass, DNSResourceType},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSQuestion {
    pub name: DomainName,
    pub qtype: DNSResourceType,
    pub qclass: DNSResourceClass,
}

impl DNSQuestion {
    pub fn new(name: DomainName, qtype: DNSResourceType) -> Self {
        Self {
            name,
            qtype,
            qclass: DNSResourceClass::IN,
        }
    }
}
