//! # Network Addresses
//!
//! Hostname, IPv4 or IPv6 address a 3bot is reachable on.
//!
//! Binary form: one byte `type | length << 2`, then the raw bytes
//! (hostname as ASCII, IPs as octets).

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{CodecError, Decode, Decoder, Encode, Encoder};

use super::errors::EntityError;

/// Longest hostname (in bytes) accepted.
pub const MAX_HOSTNAME_LENGTH: usize = 63;

lazy_static! {
    static ref HOSTNAME_REGEX: Regex = Regex::new(
        r"^(([a-zA-Z])|([a-zA-Z][a-zA-Z])|([a-zA-Z][0-9])|([0-9][a-zA-Z])|([a-zA-Z0-9][a-zA-Z0-9\-_]{1,61}[a-zA-Z0-9]))\.([a-zA-Z]{2,6}|[a-zA-Z0-9\-]{2,30}\.[a-zA-Z]{2,3})$"
    )
    .expect("hostname regex is valid");
}

/// Kind of a [`NetworkAddress`], also its binary tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum NetworkAddressType {
    Hostname = 0,
    Ipv4 = 1,
    Ipv6 = 2,
}

/// Hostname or IP address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkAddress {
    kind: NetworkAddressType,
    addr: Vec<u8>,
}

impl NetworkAddress {
    pub fn new(addr: &str) -> Result<Self, EntityError> {
        if addr.is_empty() {
            return Err(EntityError::NilNetworkAddress);
        }
        if HOSTNAME_REGEX.is_match(addr) {
            if addr.len() > MAX_HOSTNAME_LENGTH {
                return Err(EntityError::HostnameTooLong { length: addr.len() });
            }
            return Ok(Self {
                kind: NetworkAddressType::Hostname,
                addr: addr.as_bytes().to_vec(),
            });
        }
        match addr.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => Ok(Self {
                kind: NetworkAddressType::Ipv4,
                addr: ip.octets().to_vec(),
            }),
            Ok(IpAddr::V6(ip)) => Ok(Self {
                kind: NetworkAddressType::Ipv6,
                addr: ip.octets().to_vec(),
            }),
            Err(_) => Err(EntityError::InvalidNetworkAddress {
                address: addr.to_string(),
            }),
        }
    }

    pub fn kind(&self) -> NetworkAddressType {
        self.kind
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NetworkAddressType::Hostname => f.write_str(&String::from_utf8_lossy(&self.addr)),
            NetworkAddressType::Ipv4 => {
                let octets: [u8; 4] = self.addr.as_slice().try_into().map_err(|_| fmt::Error)?;
                write!(f, "{}", Ipv4Addr::from(octets))
            }
            NetworkAddressType::Ipv6 => {
                let octets: [u8; 16] = self.addr.as_slice().try_into().map_err(|_| fmt::Error)?;
                write!(f, "{}", Ipv6Addr::from(octets))
            }
        }
    }
}

impl fmt::Debug for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NetworkAddress({})", self)
    }
}

impl FromStr for NetworkAddress {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Encode for NetworkAddress {
    fn encode(&self, enc: &mut Encoder) {
        enc.put_u8(self.kind as u8 | (self.addr.len() as u8) << 2)
            .put_raw(&self.addr);
    }
}

impl Decode for NetworkAddress {
    fn decode(dec: &mut Decoder<'_>) -> Result<Self, CodecError> {
        let type_and_length = dec.get_u8()?;
        let length = (type_and_length >> 2) as usize;
        let kind = match type_and_length & 3 {
            0 if length <= MAX_HOSTNAME_LENGTH => NetworkAddressType::Hostname,
            1 if length == 4 => NetworkAddressType::Ipv4,
            2 if length == 16 => NetworkAddressType::Ipv6,
            _ => {
                return Err(CodecError::invalid(
                    "network address",
                    format!("invalid type/length byte {:#04x}", type_and_length),
                ))
            }
        };
        let addr = dec.take(length)?.to_vec();
        if kind == NetworkAddressType::Hostname {
            let valid = std::str::from_utf8(&addr)
                .map(|s| HOSTNAME_REGEX.is_match(s))
                .unwrap_or(false);
            if !valid {
                return Err(CodecError::invalid("network address", "invalid hostname"));
            }
        }
        Ok(Self { kind, addr })
    }
}

shared_types::impl_serde_via_str!(NetworkAddress);
