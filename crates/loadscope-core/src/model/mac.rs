use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A 48-bit hardware address in canonical `aa:bb:cc:dd:ee:ff` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl FromStr for MacAddress {
    type Err = String;

    /// Accepts `:` or `-` separated hex octets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut count = 0;
        for part in s.split([':', '-']) {
            if count == 6 {
                return Err(format!("invalid MAC address: {s}"));
            }
            octets[count] = u8::from_str_radix(part, 16)
                .map_err(|_| format!("invalid MAC address octet '{part}' in {s}"))?;
            count += 1;
        }
        if count != 6 {
            return Err(format!("invalid MAC address: {s}"));
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl TryFrom<String> for MacAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_colon_and_dash_forms() {
        let colon: MacAddress = "aa:bb:cc:dd:ee:01".parse().unwrap();
        let dash: MacAddress = "AA-BB-CC-DD-EE-01".parse().unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon.as_bytes(), &[0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01]);
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!("aa:bb:cc".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee:ff:00".parse::<MacAddress>().is_err());
        assert!("zz:bb:cc:dd:ee:ff".parse::<MacAddress>().is_err());
    }

    #[test]
    fn displays_canonical_form() {
        let mac = MacAddress::new([0xaa, 0x0b, 0xcc, 0xdd, 0xee, 0x01]);
        assert_eq!(mac.to_string(), "aa:0b:cc:dd:ee:01");
    }
}
