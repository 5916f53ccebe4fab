/// Calculate the key tag of DNSKEY RDATA (RFC 4034 Appendix B)
pub fn calculate_key_tag(rdata: &[u8]) -> u16 {
    // RSAMD5 keys use the low 16 bits of the modulus
    if rdata.len() >= 4 && rdata[3] == 1 {
        if rdata.len() >= 6 {
            let n = rdata.len();
            return u16::from_be_bytes([rdata[n - 3], rdata[n - 2]]);
        }
        return 0;
    }

    let mut accumulator: u32 = 0;
    for (i, &byte) in rdata.iter().enumerate() {
        if i % 2 == 0 {
            accumulator += u32::from(byte) << 8;
        } else {
            accumulator += u32::from(byte);
        }
    }

    accumulator += accumulator >> 16;
    (accumulator & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_tag_calculation() {
        // KSK, protocol 3, RSASHA1
        let mut rdata = vec![0x01, 0x01, 3, 5];
        rdata.extend(hex::decode(
            "030101a80020a95566ba42e886bb804cda84e47ef56dbd7aec612615552cec906d3e9b72dc4f90d3fc09b8e9d0ff2ae8ee5ed8cd61d7622c39ee2d76a2153bc0ac8b9e254125c46e0a224507fb358d7f6b5d7a42f75e60b9748e7c0747e2447f4bd7d10ca24bb1498de34a504406bbeb3b041fe48d0ad2b1de5adadb87d0c8824e7cc4dc3e5b7f0b3e8ac72c3d3d8aa7251abcaad82ad5ececed8cd83825d19ffd95e93bca729fdd88901b20fc598fb6a0779ddfa95e3e42ca9d0a7739d3c4ad3a7a5a30b3c60a73a6f09fdb812746e0d69edfba06754465f2e1dd5e3802e6d05bd6148e38fd8ca1632b71f6559fe9b6e18d73c5a750e3e2f2f205972e7b28ae04ddae5e27915a08d217db5ce090c119d23f79fb"
        ).unwrap());

        assert_eq!(calculate_key_tag(&rdata), 55495);
    }

    #[test]
    fn test_key_tag_rsamd5() {
        // Low 16 bits of the modulus: the two octets before the last one
        let rdata = vec![0x01, 0x01, 3, 1, 0x12, 0x34, 0x56, 0x78];
        assert_eq!(calculate_key_tag(&rdata), 0x3456);
    }

    #[test]
    fn test_key_tag_odd_length() {
        let rdata = [0x01, 0x00, 3, 15, 0xFF];
        // 0x0100 + 0x030F + 0xFF00 = 0x1030F, carry folded back in
        assert_eq!(calculate_key_tag(&rdata), 0x0310);
    }
}
