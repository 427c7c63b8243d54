use crate::traits::i2c::{BusProvider, I2cAddress};
use crate::traits::sensors::AcquisitionError;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use heapless::Vec;

/// Selector plus at most a two byte payload.
pub const MAX_FRAME: usize = 3;

/// Wait after a write that carries configuration bytes.
pub const CONFIGURATION_SETTLE: Duration = Duration::from_millis(15);

/// Wait after a write that triggers a conversion or selects a register for reading.
pub const CONVERSION_SETTLE: Duration = Duration::from_micros(62_500);

/// Byte-level access to one device address on a bus.
///
/// Each write is followed by the settle delay the caller names for the
/// register; skipping it makes the next read return stale or no data.
pub struct I2cTransport<I, D> {
    i2c: I,
    delay: D,
    address: I2cAddress,
}

impl<I, D> I2cTransport<I, D>
where
    I: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I, address: I2cAddress, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// Opens `bus_id` through `provider` and binds the handle to `address`.
    pub fn open<P>(
        provider: &mut P,
        bus_id: u8,
        address: u8,
        delay: D,
    ) -> Result<Self, AcquisitionError>
    where
        P: BusProvider<Bus = I>,
    {
        let i2c = provider.open(bus_id).map_err(|e| {
            error!("unable to open bus {}: {:?}", bus_id, e);
            AcquisitionError::Unavailable
        })?;
        Ok(Self::new(i2c, I2cAddress::new(address), delay))
    }

    pub fn address(&self) -> I2cAddress {
        self.address
    }

    /// Writes `selector` followed by `payload`, then waits `settle`.
    pub async fn write_command(
        &mut self,
        selector: u8,
        payload: &[u8],
        settle: Duration,
    ) -> Result<(), AcquisitionError> {
        let mut frame: Vec<u8, MAX_FRAME> = Vec::new();
        frame.push(selector).map_err(|_| AcquisitionError::Frame)?;
        frame
            .extend_from_slice(payload)
            .map_err(|_| AcquisitionError::Frame)?;

        trace!("[{:?}] write {:?}", self.address, frame.as_slice());
        self.i2c
            .write(self.address.into(), &frame)
            .await
            .map_err(|e| AcquisitionError::from_bus(e, 0))?;
        self.settle(settle).await;
        Ok(())
    }

    /// Reads a fixed-length response from the currently selected register.
    pub async fn read_response<const N: usize>(&mut self) -> Result<[u8; N], AcquisitionError> {
        let mut buf = [0; N];
        self.i2c
            .read(self.address.into(), &mut buf)
            .await
            .map_err(|e| AcquisitionError::from_bus(e, N))?;
        trace!("[{:?}] read {:?}", self.address, &buf[..]);
        Ok(buf)
    }

    /// Combined register select and read, for devices that need no
    /// conversion wait in between.
    pub async fn write_read<const N: usize>(
        &mut self,
        selector: u8,
    ) -> Result<[u8; N], AcquisitionError> {
        let mut buf = [0; N];
        self.i2c
            .write_read(self.address.into(), &[selector], &mut buf)
            .await
            .map_err(|e| AcquisitionError::from_bus(e, N))?;
        trace!("[{:?}] read {:02X}: {:?}", self.address, selector, &buf[..]);
        Ok(buf)
    }

    pub async fn settle(&mut self, duration: Duration) {
        if duration.as_ticks() > 0 {
            self.delay.delay_us(duration.as_micros() as u32).await;
        }
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }
}
