//! Typed views over the DNSSEC RDATA formats of RFC 4034 and RFC 5155.
//!
//! Each type decodes from and encodes to uncompressed wire RDATA. Names
//! embedded in RDATA are never compressed for these types.

use std::borrow::Cow;

use super::{DomainName, ParseError, enums::DNSResourceType};

/// DNSKEY flag: zone key (RFC 4034 section 2.1.1)
pub const DNSKEY_ZONE_KEY: u16 = 0x0100;
/// DNSKEY flag: secure entry point
pub const DNSKEY_SEP: u16 = 0x0001;
/// DNSKEY flag: revoked (RFC 5011)
pub const DNSKEY_REVOKE: u16 = 0x0080;
/// NSEC3 flag: opt-out (RFC 5155 section 3.1.2.1)
pub const NSEC3_OPT_OUT: u8 = 0x01;

fn be_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

fn be_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// RRSIG RDATA
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rrsig {
    pub type_covered: DNSResourceType,
    pub algorithm: u8,
    pub labels: u8,
    pub original_ttl: u32,
    pub sig_expiration: u32,
    pub sig_inception: u32,
    pub key_tag: u16,
    pub signer_name: DomainName,
    pub signature: Vec<u8>,
}

impl Rrsig {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 19 {
            return Err(ParseError::TruncatedRdata("RRSIG"));
        }

        let (signer_name, used) = DomainName::from_wire(&rdata[18..])?;

        Ok(Self {
            type_covered: be_u16(rdata, 0).into(),
            algorithm: rdata[2],
            labels: rdata[3],
            original_ttl: be_u32(rdata, 4),
            sig_expiration: be_u32(rdata, 8),
            sig_inception: be_u32(rdata, 12),
            key_tag: be_u16(rdata, 16),
            signer_name,
            signature: rdata[18 + used..].to_vec(),
        })
    }

    /// RDATA without the signature field, signer name in canonical form.
    /// This is the first half of the signed data (RFC 4034 section 3.1.8.1).
    pub fn signed_prefix(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(18 + self.signer_name.wire_len());
        data.extend_from_slice(&u16::from(self.type_covered).to_be_bytes());
        data.push(self.algorithm);
        data.push(self.labels);
        data.extend_from_slice(&self.original_ttl.to_be_bytes());
        data.extend_from_slice(&self.sig_expiration.to_be_bytes());
        data.extend_from_slice(&self.sig_inception.to_be_bytes());
        data.extend_from_slice(&self.key_tag.to_be_bytes());
        data.extend_from_slice(&self.signer_name.to_wire());
        data
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut data = self.signed_prefix();
        data.extend_from_slice(&self.signature);
        data
    }

    /// Serial number arithmetic is ignored; the window is checked as plain
    /// 32-bit timestamps.
    pub fn is_current(&self, now: u32) -> bool {
        self.sig_inception <= now && now <= self.sig_expiration
    }
}

/// DNSKEY RDATA
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dnskey {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: u8,
    pub public_key: Vec<u8>,
}

impl Dnskey {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 4 {
            return Err(ParseError::TruncatedRdata("DNSKEY"));
        }

        Ok(Self {
            flags: be_u16(rdata, 0),
            protocol: rdata[2],
            algorithm: rdata[3],
            public_key: rdata[4..].to_vec(),
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + self.public_key.len());
        data.extend_from_slice(&self.flags.to_be_bytes());
        data.push(self.protocol);
        data.push(self.algorithm);
        data.extend_from_slice(&self.public_key);
        data
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & DNSKEY_ZONE_KEY != 0
    }

    pub fn is_sep(&self) -> bool {
        self.flags & DNSKEY_SEP != 0
    }

    pub fn is_revoked(&self) -> bool {
        self.flags & DNSKEY_REVOKE != 0
    }

    pub fn key_tag(&self) -> u16 {
        crate::dnssec::key_tag::calculate_key_tag(&self.to_rdata())
    }
}

/// DS RDATA
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ds {
    pub key_tag: u16,
    pub algorithm: u8,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

impl Ds {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 5 {
            return Err(ParseError::TruncatedRdata("DS"));
        }

        Ok(Self {
            key_tag: be_u16(rdata, 0),
            algorithm: rdata[2],
            digest_type: rdata[3],
            digest: rdata[4..].to_vec(),
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + self.digest.len());
        data.extend_from_slice(&self.key_tag.to_be_bytes());
        data.push(self.algorithm);
        data.push(self.digest_type);
        data.extend_from_slice(&self.digest);
        data
    }
}

/// Type bitmap shared by NSEC and NSEC3 (RFC 4034 section 4.1.2)
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeBitmap {
    types: Vec<u16>,
}

impl TypeBitmap {
    pub fn from_types<I: IntoIterator<Item = DNSResourceType>>(types: I) -> Self {
        let mut types: Vec<u16> = types.into_iter().map(u16::from).collect();
        types.sort_unstable();
        types.dedup();
        Self { types }
    }

    pub fn parse(mut data: &[u8]) -> Result<Self, ParseError> {
        let mut types = Vec::new();
        let mut last_window: Option<u8> = None;

        while !data.is_empty() {
            if data.len() < 2 {
                return Err(ParseError::InvalidTypeBitmap);
            }
            let window = data[0];
            let len = data[1] as usize;
            if len == 0 || len > 32 || data.len() < 2 + len {
                return Err(ParseError::InvalidTypeBitmap);
            }
            if last_window.is_some_and(|w| w >= window) {
                return Err(ParseError::InvalidTypeBitmap);
            }
            last_window = Some(window);

            for (i, byte) in data[2..2 + len].iter().enumerate() {
                for bit in 0..8 {
                    if byte & (0x80 >> bit) != 0 {
                        types.push(((window as u16) << 8) | (i as u16 * 8 + bit));
                    }
                }
            }
            data = &data[2 + len..];
        }

        Ok(Self { types })
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < self.types.len() {
            let window = (self.types[i] >> 8) as u8;
            let mut bits = [0u8; 32];
            let mut len = 0;
            while i < self.types.len() && (self.types[i] >> 8) as u8 == window {
                let low = (self.types[i] & 0xFF) as usize;
                bits[low / 8] |= 0x80 >> (low % 8);
                len = len.max(low / 8 + 1);
                i += 1;
            }
            out.push(window);
            out.push(len as u8);
            out.extend_from_slice(&bits[..len]);
        }
        out
    }

    pub fn contains(&self, rtype: DNSResourceType) -> bool {
        self.types.binary_search(&u16::from(rtype)).is_ok()
    }
}

/// NSEC RDATA
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec {
    pub next_name: DomainName,
    pub types: TypeBitmap,
}

impl Nsec {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        let (next_name, used) = DomainName::from_wire(rdata)?;
        Ok(Self {
            next_name,
            types: TypeBitmap::parse(&rdata[used..])?,
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut data = self.next_name.to_wire();
        data.extend_from_slice(&self.types.to_wire());
        data
    }
}

/// NSEC3 RDATA
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nsec3 {
    pub hash_algorithm: u8,
    pub flags: u8,
    pub iterations: u16,
    pub salt: Vec<u8>,
    pub next_hashed_owner: Vec<u8>,
    pub types: TypeBitmap,
}

impl Nsec3 {
    pub fn parse(rdata: &[u8]) -> Result<Self, ParseError> {
        if rdata.len() < 5 {
            return Err(ParseError::TruncatedRdata("NSEC3"));
        }
        let salt_len = rdata[4] as usize;
        let hash_len_at = 5 + salt_len;
        let hash_len = *rdata
            .get(hash_len_at)
            .ok_or(ParseError::TruncatedRdata("NSEC3"))? as usize;
        let bitmap_at = hash_len_at + 1 + hash_len;
        if rdata.len() < bitmap_at {
            return Err(ParseError::TruncatedRdata("NSEC3"));
        }

        Ok(Self {
            hash_algorithm: rdata[0],
            flags: rdata[1],
            iterations: be_u16(rdata, 2),
            salt: rdata[5..hash_len_at].to_vec(),
            next_hashed_owner: rdata[hash_len_at + 1..bitmap_at].to_vec(),
            types: TypeBitmap::parse(&rdata[bitmap_at..])?,
        })
    }

    pub fn to_rdata(&self) -> Vec<u8> {
        let mut data = vec![self.hash_algorithm, self.flags];
        data.extend_from_slice(&self.iterations.to_be_bytes());
        data.push(self.salt.len() as u8);
        data.extend_from_slice(&self.salt);
        data.push(self.next_hashed_owner.len() as u8);
        data.extend_from_slice(&self.next_hashed_owner);
        data.extend_from_slice(&self.types.to_wire());
        data
    }

    pub fn opt_out(&self) -> bool {
        self.flags & NSEC3_OPT_OUT != 0
    }
}

/// Piece of an RDATA layout, as far as canonical form is concerned
#[derive(Clone, Copy)]
enum Field {
    Fixed(usize),
    /// Uncompressed domain name
    Name,
    /// <character-string>, length octet first
    Text,
}

/// Layout up to the last embedded name of the types whose names are
/// lowercased in canonical form (RFC 4034 section 6.2; NSEC was dropped from
/// that list by RFC 6840 section 5.1, RRSIG is never signed itself)
fn name_layout(rtype: DNSResourceType) -> Option<&'static [Field]> {
    use Field::{Fixed, Name, Text};

    let layout: &'static [Field] = match u16::from(rtype) {
        // NS MD MF CNAME MB MG MR PTR DNAME
        2 | 3 | 4 | 5 | 7 | 8 | 9 | 12 | 39 => &[Name],
        // SOA, MINFO, RP
        6 | 14 | 17 => &[Name, Name],
        // MX, AFSDB, RT, KX
        15 | 18 | 21 | 36 => &[Fixed(2), Name],
        // PX
        26 => &[Fixed(2), Name, Name],
        // SRV
        33 => &[Fixed(6), Name],
        // NAPTR
        35 => &[Fixed(4), Text, Text, Text, Name],
        _ => return None,
    };
    Some(layout)
}

fn lowercase_names(layout: &[Field], rdata: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(rdata.len());
    let mut pos = 0;

    for &field in layout {
        match field {
            Field::Fixed(len) => {
                out.extend_from_slice(rdata.get(pos..pos + len)?);
                pos += len;
            }
            Field::Text => {
                let len = usize::from(*rdata.get(pos)?) + 1;
                out.extend_from_slice(rdata.get(pos..pos + len)?);
                pos += len;
            }
            Field::Name => {
                let (name, used) = DomainName::from_wire(rdata.get(pos..)?).ok()?;
                out.extend_from_slice(&name.to_wire());
                pos += used;
            }
        }
    }
    out.extend_from_slice(rdata.get(pos..)?);
    Some(out)
}

/// RDATA in the canonical form of RFC 4034 section 6.2.
///
/// Types without embedded names, and RDATA that does not decode, come back
/// unchanged.
pub fn canonical_rdata(rtype: DNSResourceType, rdata: &[u8]) -> Cow<'_, [u8]> {
    match name_layout(rtype).and_then(|layout| lowercase_names(layout, rdata)) {
        Some(canonical) if canonical != rdata => Cow::Owned(canonical),
        _ => Cow::Borrowed(rdata),
    }
}

/// Owned variant of [`canonical_rdata`]
pub fn into_canonical(rtype: DNSResourceType, rdata: Vec<u8>) -> Vec<u8> {
    name_layout(rtype)
        .and_then(|layout| lowercase_names(layout, &rdata))
        .unwrap_or(rdata)
}
