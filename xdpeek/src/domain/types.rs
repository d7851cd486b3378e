//! Core value types

use std::fmt;

use xdpeek_common::{IPPROTO_ICMP, IPPROTO_TCP, IPPROTO_UDP};

/// Transport protocol carried by an IPv4 packet
///
/// Built from the raw IANA number; values without a name are kept as-is and
/// rendered as their decimal numeral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Icmp,
    Tcp,
    Udp,
    Other(u8),
}

impl From<u8> for Protocol {
    fn from(value: u8) -> Self {
        match value {
            IPPROTO_ICMP => Self::Icmp,
            IPPROTO_TCP => Self::Tcp,
            IPPROTO_UDP => Self::Udp,
            n => Self::Other(n),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Icmp => f.write_str("ICMP"),
            Self::Tcp => f.write_str("TCP"),
            Self::Udp => f.write_str("UDP"),
            Self::Other(n) => write!(f, "{n}"),
        }
    }
}
