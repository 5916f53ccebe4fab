use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use super::ParseError;

const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;

/// A case-insensitive domain name.
///
/// Labels are raw octets with ASCII letters lowercased, leftmost first,
/// without the empty root label. The root name has no labels. Ordering is
/// the DNSSEC canonical order of RFC 4034 section 6.1.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct DomainName {
    labels: SmallVec<[Vec<u8>; 4]>,
}

impl DomainName {
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a name from labels, leftmost first
    pub fn from_labels<I, S>(labels: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut out = SmallVec::new();
        let mut wire_len = 1;
        for label in labels {
            let label = label.as_ref();
            if label.is_empty() || label.len() > MAX_LABEL_LEN {
                return Err(ParseError::InvalidLabel);
            }
            wire_len += label.len() + 1;
            out.push(label.to_ascii_lowercase());
        }
        if wire_len > MAX_NAME_LEN {
            return Err(ParseError::NameTooLong);
        }
        Ok(Self { labels: out })
    }

    /// Decode an uncompressed wire-format name, returning it with the
    /// number of bytes consumed
    pub fn from_wire(data: &[u8]) -> Result<(Self, usize), ParseError> {
        let mut labels = Vec::new();
        let mut pos = 0;

        loop {
            let len = *data.get(pos).ok_or(ParseError::InvalidLabel)? as usize;
            pos += 1;
            if len == 0 {
                break;
            }
            if len > MAX_LABEL_LEN {
                return Err(ParseError::CompressedName);
            }
            let label = data.get(pos..pos + len).ok_or(ParseError::InvalidLabel)?;
            labels.push(label);
            pos += len;
        }

        Ok((Self::from_labels(labels)?, pos))
    }

    /// Lowercased wire format, as used for canonical forms and hashing
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());
        for label in &self.labels {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
        out
    }

    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.labels.first().is_some_and(|l| l.as_slice() == b"*")
    }

    /// Number of rightmost labels shared with `other`
    pub fn matched_labels(&self, other: &DomainName) -> usize {
        self.labels
            .iter()
            .rev()
            .zip(other.labels.iter().rev())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Strictly below `other`
    pub fn is_subdomain_of(&self, other: &DomainName) -> bool {
        self.labels.len() > other.labels.len() && self.matched_labels(other) == other.labels.len()
    }

    /// Equal to or below `other`
    pub fn is_at_or_below(&self, other: &DomainName) -> bool {
        self == other || self.is_subdomain_of(other)
    }

    /// The name made of the rightmost `count` labels
    pub fn suffix(&self, count: usize) -> DomainName {
        let skip = self.labels.len().saturating_sub(count);
        Self {
            labels: self.labels[skip..].iter().cloned().collect(),
        }
    }

    pub fn parent(&self) -> Option<DomainName> {
        if self.is_root() {
            return None;
        }
        Some(self.suffix(self.labels.len() - 1))
    }

    /// `label.self`
    pub fn prepend(&self, label: &str) -> Result<DomainName, ParseError> {
        Self::from_labels(std::iter::once(label.as_bytes()).chain(self.labels.iter().map(Vec::as_slice)))
    }

    /// `*.self`
    pub fn wildcard(&self) -> Result<DomainName, ParseError> {
        self.prepend("*")
    }
}

impl Ord for DomainName {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.labels.iter().rev().zip(other.labels.iter().rev()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.labels.len().cmp(&other.labels.len())
    }
}

impl PartialOrd for DomainName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for DomainName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_labels(trimmed.split('.'))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for label in &self.labels {
            write_label(f, label)?;
            f.write_str(".")?;
        }
        Ok(())
    }
}

/// Presentation form of a label: dots and backslashes escaped, bytes
/// outside printable ASCII as `\DDD` (RFC 4343 section 2.1)
fn write_label(f: &mut fmt::Formatter<'_>, label: &[u8]) -> fmt::Result {
    for &byte in label {
        match byte {
            b'.' | b'\\' => write!(f, "\\{}", byte as char)?,
            0x21..=0x7E => write!(f, "{}", byte as char)?,
            _ => write!(f, "\\{:03}", byte)?,
        }
    }
    Ok(())
}

impl fmt::Debug for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainName({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> DomainName {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(name("WWW.Example.COM").to_string(), "www.example.com.");
        assert_eq!(name(".").to_string(), ".");
        assert!(name("").is_root());
        assert!("a..b".parse::<DomainName>().is_err());
        assert!(name(&"a".repeat(63)).label_count() == 1);
        assert!(DomainName::from_str(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_ancestry() {
        let child = name("a.b.example.com");
        let zone = name("example.com");

        assert!(child.is_subdomain_of(&zone));
        assert!(!zone.is_subdomain_of(&zone));
        assert!(zone.is_at_or_below(&zone));
        assert!(child.is_subdomain_of(&DomainName::root()));
        assert!(!name("badexample.com").is_subdomain_of(&zone));
        assert_eq!(child.matched_labels(&name("other.example.com")), 2);
        assert_eq!(child.suffix(3), name("b.example.com"));
        assert_eq!(zone.parent(), Some(name("com")));
        assert_eq!(DomainName::root().parent(), None);
    }

    #[test]
    fn test_canonical_order() {
        // RFC 4034 section 6.1 example ordering
        let ordered = [
            "example",
            "a.example",
            "yljkjljk.a.example",
            "z.a.example",
            "zabc.a.example",
            "z.example",
            "*.z.example",
        ];
        let mut names: Vec<DomainName> = ordered.iter().rev().map(|s| name(s)).collect();
        names.sort();
        let sorted: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let expected: Vec<String> = [
            "example.",
            "a.example.",
            "yljkjljk.a.example.",
            "z.a.example.",
            "zabc.a.example.",
            "z.example.",
            "*.z.example.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn test_wire_round_trip() {
        let original = name("Mail.Example.org");
        let wire = original.to_wire();
        assert_eq!(wire[0], 4);
        assert_eq!(&wire[1..5], b"mail");
        let (decoded, used) = DomainName::from_wire(&wire).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(used, wire.len());
        assert_eq!(original.wire_len(), wire.len());
    }

    #[test]
    fn test_binary_labels_survive_wire_decoding() {
        let mut wire = vec![2, 0xFF, 0xFE, 3, b'A', b'.', b'b'];
        wire.extend_from_slice(&name("example").to_wire());

        let (decoded, used) = DomainName::from_wire(&wire).unwrap();
        assert_eq!(used, wire.len());
        assert_eq!(decoded.labels()[0], vec![0xFF, 0xFE]);
        assert_eq!(decoded.labels()[1], b"a.b".to_vec());

        let mut lowered = wire.clone();
        lowered[4] = b'a';
        assert_eq!(decoded.to_wire(), lowered);
        assert_eq!(decoded.wire_len(), wire.len());
        assert_eq!(decoded.to_string(), "\\255\\254.a\\.b.example.");
    }
}
