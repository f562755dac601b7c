use bytes::{BufMut, BytesMut};
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

use crate::{
    Decode, DecodeError, Encode,
    common::unit_error,
    encode::{EncodeError, Encoded, ParamType},
    postgres::{Oid, PgFormat, PgType, oid},
    row::Column,
    value::ValueRef,
};

// `PGSQL_AF_INET` and `PGSQL_AF_INET6` in `utils/inet.h`
const AF_INET: u8 = 2;
const AF_INET6: u8 = 3;

/// Postgres `inet` and `cidr` value, an ip address with its netmask.
///
/// Canonical string form is always `addr/netmask`.
///
/// ```
/// use postcode::Inet;
///
/// let net: Inet = "192.168.1.0/24".parse().unwrap();
/// assert_eq!(net.netmask(), 24);
/// assert!(!net.has_host_bits());
/// assert_eq!(net.to_string(), "192.168.1.0/24");
///
/// let host: Inet = "::1".parse().unwrap();
/// assert_eq!(host.to_string(), "::1/128");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Inet {
    addr: IpAddr,
    netmask: u8,
}

impl Inet {
    /// Create new [`Inet`], returns [`None`] if `netmask` is larger than the address bits.
    pub const fn new(addr: IpAddr, netmask: u8) -> Option<Inet> {
        match netmask <= max_netmask(&addr) {
            true => Some(Self { addr, netmask }),
            false => None,
        }
    }

    /// Returns the address.
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    /// Returns the netmask length.
    pub const fn netmask(&self) -> u8 {
        self.netmask
    }

    /// Returns `true` if netmask covers the whole address.
    pub const fn is_host(&self) -> bool {
        self.netmask == max_netmask(&self.addr)
    }

    /// Returns the address with host bits cleared.
    pub fn network(&self) -> IpAddr {
        match self.addr {
            IpAddr::V4(v4) => {
                let mask = u32::MAX.checked_shl(32 - self.netmask as u32).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) => {
                let mask = u128::MAX.checked_shl(128 - self.netmask as u32).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask))
            }
        }
    }

    /// Returns `true` if any bit right of the netmask is set, which `cidr` rejects.
    pub fn has_host_bits(&self) -> bool {
        self.network() != self.addr
    }
}

const fn max_netmask(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

impl From<IpAddr> for Inet {
    fn from(addr: IpAddr) -> Self {
        Self { netmask: max_netmask(&addr), addr }
    }
}

impl fmt::Display for Inet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.netmask)
    }
}

impl FromStr for Inet {
    type Err = InvalidInet;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, netmask) = match s.split_once('/') {
            Some((addr, netmask)) => (addr, Some(netmask)),
            None => (s, None),
        };
        let addr: IpAddr = addr.parse().map_err(|_| InvalidInet)?;
        match netmask {
            Some(netmask) => Inet::new(addr, netmask.parse().map_err(|_| InvalidInet)?).ok_or(InvalidInet),
            None => Ok(Inet::from(addr)),
        }
    }
}

unit_error! {
    /// An error when parsing [`Inet`].
    pub struct InvalidInet("invalid inet address");
}

// ===== Codec =====

impl PgType for Inet {
    /// `inet` IP address/netmask, host address, netmask optional
    const OID: Oid = oid::INET;

    fn accepts(oid: Oid) -> bool {
        matches!(oid, oid::INET | oid::CIDR)
    }
}

impl PgType for IpAddr {
    /// `inet` IP address/netmask, host address, netmask optional
    const OID: Oid = oid::INET;
}

impl Decode for Inet {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        if let PgFormat::Text = col.format() {
            let text = col.text()?;
            return text.parse().map_err(|_| col.malformed(format!("invalid inet {text:?}")));
        }

        let value = col.as_slice().ok_or(DecodeError::Null)?;
        let [family, netmask, _is_cidr, nb, addr @ ..] = value else {
            return Err(col.malformed("truncated inet"));
        };
        let addr = match (*family, *nb, addr.len()) {
            (AF_INET, 4, 4) => IpAddr::V4(Ipv4Addr::new(addr[0], addr[1], addr[2], addr[3])),
            (AF_INET6, 16, 16) => {
                let mut octets = [0u8; 16];
                octets.copy_from_slice(addr);
                IpAddr::V6(Ipv6Addr::from(octets))
            }
            (family, nb, len) => {
                return Err(col.malformed(format!("invalid inet family {family} with {nb} bytes, found {len}")));
            }
        };
        Inet::new(addr, *netmask).ok_or_else(|| col.malformed(format!("invalid netmask {netmask}")))
    }
}

impl Decode for IpAddr {
    fn decode(col: Column) -> Result<Self, DecodeError> {
        let oid = col.oid();
        let inet = Inet::decode(col)?;
        match inet.is_host() {
            true => Ok(inet.addr),
            false => Err(DecodeError::malformed(oid, format!("{inet} is not a host address"))),
        }
    }
}

impl Encode<'static> for Inet {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        let is_cidr = ty.oid() == oid::CIDR;
        if is_cidr && self.has_host_bits() {
            return Err(EncodeError::malformed(ty.oid(), format!("{self} has bits set to right of mask")));
        }

        let value = match (ty.format(), self.addr) {
            (PgFormat::Text, _) => ValueRef::from(self.to_string()),
            (PgFormat::Binary, IpAddr::V4(v4)) => {
                let mut buf = [AF_INET, self.netmask, is_cidr as u8, 4, 0, 0, 0, 0];
                buf[4..].copy_from_slice(&v4.octets());
                ValueRef::inline(&buf)
            }
            (PgFormat::Binary, IpAddr::V6(v6)) => {
                let mut buf = BytesMut::with_capacity(20);
                buf.put_slice(&[AF_INET6, self.netmask, is_cidr as u8, 16]);
                buf.put_slice(&v6.octets());
                ValueRef::from(buf.freeze())
            }
        };
        Ok(Encoded::new(value, ty))
    }
}

impl Encode<'static> for IpAddr {
    fn encode(self, ty: &ParamType) -> Result<Encoded<'static>, EncodeError> {
        ty.accept::<Self>()?;
        Inet::from(self).encode(ty)
    }
}
