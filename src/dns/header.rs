#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSHeader {
    pub id: u16,
    pub qr: bool,
    pub opcode: u8,
    pub aa: bool,
    pub tc: bool,
    pub rd: bool,
    pub ra: bool,
    /// Authentic data (RFC 4035 section 3.2.3)
    pub ad: bool,
    /// Checking disabled (RFC 4035 section 3.2.2)
    pub cd: bool,
    pub rcode: u8,
}
