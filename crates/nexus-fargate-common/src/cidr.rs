//! IPv4 CIDR blocks and sequential subnet allocation

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::{Error, Result};

/// An IPv4 network in CIDR notation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ipv4Cidr {
    network: u32,
    prefix: u8,
}

impl Ipv4Cidr {
    /// Create a CIDR block; host bits must be zero
    pub fn new(addr: Ipv4Addr, prefix: u8) -> Result<Self> {
        if prefix > 32 {
            return Err(Error::validation(format!(
                "prefix length {prefix} is longer than 32"
            )));
        }
        let network = u32::from(addr);
        if network & !mask(prefix) != 0 {
            return Err(Error::validation(format!(
                "{addr}/{prefix} has host bits set"
            )));
        }
        Ok(Self { network, prefix })
    }

    /// Prefix length
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// First address of the block
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.network)
    }

    /// Number of `/mask` blocks that fit in this network
    pub fn capacity(&self, mask: u8) -> u64 {
        if mask < self.prefix || mask > 32 {
            return 0;
        }
        1u64 << (mask - self.prefix)
    }

    /// The `index`-th `/mask` block counted from the start of the network
    ///
    /// Returns `None` when the block would fall outside this network.
    pub fn subnet(&self, mask: u8, index: u64) -> Option<Self> {
        if index >= self.capacity(mask) {
            return None;
        }
        let size = 1u64 << (32 - mask);
        let start = u64::from(self.network) + index * size;
        let network = u32::try_from(start).ok()?;
        Some(Self {
            network,
            prefix: mask,
        })
    }

    /// Whether two blocks share any address
    pub fn overlaps(&self, other: &Self) -> bool {
        let shorter = self.prefix.min(other.prefix);
        self.network & mask(shorter) == other.network & mask(shorter)
    }
}

fn mask(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = s
            .split_once('/')
            .ok_or_else(|| Error::validation(format!("'{s}' is not in CIDR notation")))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|e| Error::validation(format!("'{s}': invalid address: {e}")))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|e| Error::validation(format!("'{s}': invalid prefix length: {e}")))?;
        Self::new(addr, prefix)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network(), self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_and_displays() {
        let cidr: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(cidr.prefix(), 16);
        assert_eq!(cidr.to_string(), "10.0.0.0/16");
    }

    #[rstest]
    #[case::no_slash("10.0.0.0")]
    #[case::bad_address("10.0.0/16")]
    #[case::prefix_too_long("10.0.0.0/33")]
    #[case::host_bits("10.0.0.1/16")]
    #[case::not_a_number("10.0.0.0/x")]
    fn rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<Ipv4Cidr>().is_err());
    }

    #[test]
    fn allocates_sequential_subnets() {
        let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        assert_eq!(vpc.capacity(24), 256);
        assert_eq!(vpc.subnet(24, 0).unwrap().to_string(), "10.0.0.0/24");
        assert_eq!(vpc.subnet(24, 5).unwrap().to_string(), "10.0.5.0/24");
        assert!(vpc.subnet(24, 256).is_none());
        assert!(vpc.subnet(8, 0).is_none());
    }

    #[test]
    fn overlap_detection() {
        let a: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
        let b: Ipv4Cidr = "10.0.3.0/24".parse().unwrap();
        let c: Ipv4Cidr = "10.1.0.0/24".parse().unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }
}
