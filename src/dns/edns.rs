/// DNSSEC OK bit in the EDNS flags word (RFC 3225)
pub const DO_FLAG: u16 = 0x8000;

/// EDNS0 OPT pseudo-record as far as validation cares about it
/// RFC 6891: https://tools.ietf.org/html/rfc6891
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdnsOpt {
    /// UDP payload size that can be handled by the requestor
    pub udp_payload_size: u16,
    /// Extended RCODE (high 8 bits)
    pub extended_rcode: u8,
    /// EDNS version (currently 0)
    pub version: u8,
    /// EDNS flags (16 bits)
    pub flags: u16,
}

impl Default for EdnsOpt {
    fn default() -> Self {
        Self::new()
    }
}

impl EdnsOpt {
    pub fn new() -> Self {
        Self {
            udp_payload_size: 4096,
            extended_rcode: 0,
            version: 0,
            flags: 0,
        }
    }

    pub fn with_payload_size(payload_size: u16) -> Self {
        Self {
            udp_payload_size: payload_size,
            ..Self::new()
        }
    }

    /// Rebuild from the CLASS and TTL fields of an OPT record
    pub fn from_resource_fields(class: u16, ttl: u32) -> Self {
        Self {
            udp_payload_size: class,
            extended_rcode: ((ttl >> 24) & 0xFF) as u8,
            version: ((ttl >> 16) & 0xFF) as u8,
            flags: (ttl & 0xFFFF) as u16,
        }
    }

    /// Check if DNSSEC OK (DO) flag is set
    pub fn do_flag(&self) -> bool {
        (self.flags & DO_FLAG) != 0
    }

    pub fn set_do_flag(&mut self, value: bool) {
        if value {
            self.flags |= DO_FLAG;
        } else {
            self.flags &= !DO_FLAG;
        }
    }
}

impl std::fmt::Display for EdnsOpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EDNS0: payload_size={}, version={}, flags=0x{:04x}{}",
            self.udp_payload_size,
            self.version,
            self.flags,
            if self.do_flag() { " (DO)" } else { "" }
        )
    }
}
