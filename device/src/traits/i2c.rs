use crate::traits::sensors::AcquisitionError;
use core::fmt::{Debug, Formatter};
use embedded_hal_async::i2c::I2c;

/// Seven-bit device address on a bus.
#[derive(Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cAddress(u8);

impl I2cAddress {
    pub const fn new(val: u8) -> Self {
        Self(val)
    }
}

impl From<u8> for I2cAddress {
    fn from(addr: u8) -> Self {
        Self(addr)
    }
}

impl From<I2cAddress> for u8 {
    fn from(addr: I2cAddress) -> Self {
        addr.0
    }
}

impl Debug for I2cAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Opens bus endpoints by number, e.g. `/dev/i2c-1` on Linux hosts.
///
/// Every driver instance opens its own handle; handles are never shared
/// between devices.
pub trait BusProvider {
    type Bus: I2c;

    /// Fails with [`AcquisitionError::Unavailable`] when the endpoint does
    /// not exist or cannot be opened.
    fn open(&mut self, bus_id: u8) -> Result<Self::Bus, AcquisitionError>;
}
