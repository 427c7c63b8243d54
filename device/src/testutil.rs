//! Simulated hardware for host tests.

use crate::drivers::sensors::hdc1000::register::config::{ACQUISITION_MODE, BATTERY_STATUS, RESET};
use crate::drivers::sensors::hdc1000::register::{
    CONFIGURATION, DEVICE_ID, HUMIDITY, MANUFACTURER_ID, SERIAL_ID_HIGH, SERIAL_ID_LOW,
    SERIAL_ID_MID, TEMPERATURE,
};
use crate::drivers::transport::CONVERSION_SETTLE;
use crate::traits::i2c::BusProvider;
use crate::traits::log::{Event, LogSink};
use crate::traits::sensors::AcquisitionError;
use core::cell::RefCell;
use core::sync::atomic::{AtomicU64, Ordering};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use std::string::String;
use std::sync::Arc;
use std::vec::Vec;

type Shared<T> = Arc<Mutex<CriticalSectionRawMutex, RefCell<T>>>;

fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(RefCell::new(value)))
}

/// Simulated time in microseconds, advanced only by [`RecordingDelay`].
#[derive(Clone, Default)]
pub struct SimClock(Arc<AtomicU64>);

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_us(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn advance_us(&self, us: u64) {
        self.0.fetch_add(us, Ordering::SeqCst);
    }
}

/// A delay that returns immediately, advancing a [`SimClock`] and remembering
/// every wait.
#[derive(Clone)]
pub struct RecordingDelay {
    clock: SimClock,
    waits: Shared<Vec<u32>>,
}

impl Default for RecordingDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDelay {
    pub fn new() -> Self {
        Self {
            clock: SimClock::new(),
            waits: shared(Vec::new()),
        }
    }

    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// Every wait so far, in microseconds.
    pub fn waits_us(&self) -> Vec<u32> {
        self.waits.lock(|w| w.borrow().clone())
    }

    fn record(&self, us: u32) {
        self.clock.advance_us(us as u64);
        self.waits.lock(|w| w.borrow_mut().push(us));
    }
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.record(ns.div_ceil(1_000));
    }

    async fn delay_us(&mut self, us: u32) {
        self.record(us);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.record(ms.saturating_mul(1_000));
    }
}

struct Hdc1000State {
    address: u8,
    pointer: Option<u8>,
    selected_at: u64,
    config: u16,
    temperature: u16,
    humidity: u16,
    manufacturer_id: u16,
    device_id: u16,
    serial: [u16; 3],
    fault: Option<ErrorKind>,
    writes: Vec<Vec<u8>>,
}

/// Register-level model of an HDC1000.
///
/// Clones share the same device. Measurement registers NACK when read
/// before the conversion time has passed on the shared [`SimClock`].
#[derive(Clone)]
pub struct SimulatedHdc1000 {
    clock: SimClock,
    state: Shared<Hdc1000State>,
}

impl SimulatedHdc1000 {
    pub const POWER_ON_CONFIG: u16 = ACQUISITION_MODE;

    pub fn new(address: u8, clock: SimClock) -> Self {
        Self {
            clock,
            state: shared(Hdc1000State {
                address,
                pointer: None,
                selected_at: 0,
                config: Self::POWER_ON_CONFIG,
                temperature: 0,
                humidity: 0,
                manufacturer_id: 0x5449,
                device_id: 0x1000,
                serial: [0x0123, 0x4567, 0x8900],
                fault: None,
                writes: Vec::new(),
            }),
        }
    }

    /// Sets the raw register values of both channels.
    pub fn set_raw(&self, temperature: u16, humidity: u16) {
        self.with(|s| {
            s.temperature = temperature;
            s.humidity = humidity;
        })
    }

    /// Sets both channels to the register values closest to the given
    /// temperature and relative humidity.
    pub fn set_reading(&self, celsius: f32, relative_humidity: f32) {
        let temperature = ((celsius + 40.0) / 165.0 * 65536.0).clamp(0.0, 65535.0) as u16;
        let humidity = (relative_humidity / 100.0 * 65536.0).clamp(0.0, 65535.0) as u16;
        self.set_raw(temperature, humidity)
    }

    pub fn config(&self) -> u16 {
        self.with(|s| s.config)
    }

    /// Overrides the configuration register, including read-only bits.
    pub fn set_config(&self, config: u16) {
        self.with(|s| s.config = config)
    }

    /// Every transfer fails with `fault` until cleared with `None`.
    pub fn fail_with(&self, fault: Option<ErrorKind>) {
        self.with(|s| s.fault = fault)
    }

    /// Every write frame received so far.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.with(|s| s.writes.clone())
    }

    fn with<R>(&self, f: impl FnOnce(&mut Hdc1000State) -> R) -> R {
        self.state.lock(|s| f(&mut s.borrow_mut()))
    }

    fn write_frame(&self, bytes: &[u8]) -> Result<(), ErrorKind> {
        let now = self.clock.now_us();
        self.with(|s| {
            s.writes.push(bytes.to_vec());
            let (&selector, payload) = match bytes.split_first() {
                Some(split) => split,
                None => return Ok(()),
            };
            s.pointer = Some(selector);
            s.selected_at = now;
            match (selector, payload) {
                (_, []) => Ok(()),
                (CONFIGURATION, &[high, _]) => {
                    let word = (high as u16) << 8;
                    s.config = if word & RESET != 0 {
                        Self::POWER_ON_CONFIG
                    } else {
                        (word & !BATTERY_STATUS) | (s.config & BATTERY_STATUS)
                    };
                    Ok(())
                }
                _ => Err(ErrorKind::Other),
            }
        })
    }

    fn read_frame(&self, buf: &mut [u8]) -> Result<(), ErrorKind> {
        let now = self.clock.now_us();
        self.with(|s| {
            let pointer = s.pointer.ok_or(ErrorKind::Other)?;
            let word = match pointer {
                TEMPERATURE | HUMIDITY
                    if now - s.selected_at < CONVERSION_SETTLE.as_micros() =>
                {
                    return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                }
                TEMPERATURE => s.temperature,
                HUMIDITY => s.humidity,
                CONFIGURATION => s.config,
                SERIAL_ID_HIGH => s.serial[0],
                SERIAL_ID_MID => s.serial[1],
                SERIAL_ID_LOW => s.serial[2],
                MANUFACTURER_ID => s.manufacturer_id,
                DEVICE_ID => s.device_id,
                _ => return Err(ErrorKind::Other),
            };
            if buf.len() > 2 {
                return Err(ErrorKind::Overrun);
            }
            let bytes = word.to_be_bytes();
            buf.copy_from_slice(&bytes[..buf.len()]);
            Ok(())
        })
    }
}

impl ErrorType for SimulatedHdc1000 {
    type Error = ErrorKind;
}

impl I2c for SimulatedHdc1000 {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let (expected, fault) = self.with(|s| (s.address, s.fault));
        if address != expected {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        if let Some(fault) = fault {
            return Err(fault);
        }
        for operation in operations {
            match operation {
                Operation::Write(bytes) => self.write_frame(bytes)?,
                Operation::Read(buf) => self.read_frame(buf)?,
            }
        }
        Ok(())
    }
}

/// Bus lines by number, one simulated device on each.
#[derive(Clone, Default)]
pub struct SimulatedBus {
    lines: Vec<(u8, SimulatedHdc1000)>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line(mut self, bus_id: u8, device: SimulatedHdc1000) -> Self {
        self.lines.push((bus_id, device));
        self
    }
}

impl BusProvider for SimulatedBus {
    type Bus = SimulatedHdc1000;

    fn open(&mut self, bus_id: u8) -> Result<Self::Bus, AcquisitionError> {
        self.lines
            .iter()
            .find(|(id, _)| *id == bus_id)
            .map(|(_, device)| device.clone())
            .ok_or(AcquisitionError::Unavailable)
    }
}

/// Keeps every event, rendered with `Debug`.
#[derive(Clone)]
pub struct RecordingSink {
    events: Shared<Vec<String>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: shared(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock(|e| e.borrow().clone())
    }

    /// Number of events whose variant name is `kind`.
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock(|e| e.borrow().iter().filter(|e| e.starts_with(kind)).count())
    }

    pub fn faults(&self) -> usize {
        self.count("AcquisitionFault")
    }
}

impl LogSink for RecordingSink {
    fn record(&self, event: &Event<'_>) {
        let rendered = std::format!("{:?}", event);
        self.events.lock(|e| e.borrow_mut().push(rendered));
    }
}
