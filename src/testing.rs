//! Scripted bus and delay used by the unit tests.
//!
//! A [`FakeDevice`] answers reads with the bytes scripted for the last command
//! byte written to it, which covers both register-pointer parts (BME280,
//! HDC2080, TCS34725) and command-word parts (SHTC3, HTU21D, MPRLS).

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

pub struct FakeDevice {
    address: u8,
    responses: Vec<(Option<u8>, Vec<u8>)>,
    pointer: Option<u8>,
    offline: bool,
    writes: Vec<Vec<u8>>,
}

impl FakeDevice {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            responses: Vec::new(),
            pointer: None,
            offline: false,
            writes: Vec::new(),
        }
    }

    /// Bytes returned by a read following a write that starts with `command`.
    pub fn respond(self, command: u8, bytes: &[u8]) -> Self {
        self.respond_to(Some(command), bytes)
    }

    /// Bytes returned by a read that was not preceded by any write.
    pub fn respond_idle(self, bytes: &[u8]) -> Self {
        self.respond_to(None, bytes)
    }

    fn respond_to(mut self, key: Option<u8>, bytes: &[u8]) -> Self {
        self.set(key, bytes);
        self
    }

    fn set(&mut self, key: Option<u8>, bytes: &[u8]) {
        self.responses.retain(|(k, _)| *k != key);
        self.responses.push((key, bytes.to_vec()));
    }

    fn fill(&self, buf: &mut [u8]) {
        buf.fill(0);
        if let Some((_, bytes)) = self.responses.iter().find(|(k, _)| *k == self.pointer) {
            let n = bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&bytes[..n]);
        }
    }
}

#[derive(Default)]
pub struct FakeBus {
    devices: Vec<FakeDevice>,
    transactions: Vec<u8>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, device: FakeDevice) {
        self.devices.retain(|d| d.address != device.address);
        self.devices.push(device);
    }

    pub fn with(mut self, device: FakeDevice) -> Self {
        self.add(device);
        self
    }

    fn device_mut(&mut self, address: u8) -> &mut FakeDevice {
        self.devices
            .iter_mut()
            .find(|d| d.address == address)
            .expect("no fake device at address")
    }

    pub fn set_response(&mut self, address: u8, command: u8, bytes: &[u8]) {
        self.device_mut(address).set(Some(command), bytes);
    }

    /// An offline device stops acknowledging its address.
    pub fn set_offline(&mut self, address: u8, offline: bool) {
        self.device_mut(address).offline = offline;
    }

    pub fn writes(&self, address: u8) -> &[Vec<u8>] {
        self.devices
            .iter()
            .find(|d| d.address == address)
            .map(|d| d.writes.as_slice())
            .unwrap_or(&[])
    }

    /// Addresses of every transaction, in order.
    pub fn transactions(&self) -> &[u8] {
        &self.transactions
    }

    pub fn clear_log(&mut self) {
        self.transactions.clear();
        for device in &mut self.devices {
            device.writes.clear();
        }
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.transactions.push(address);
        let device = self
            .devices
            .iter_mut()
            .find(|d| d.address == address && !d.offline)
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?;

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    device.pointer = bytes.first().copied();
                    device.writes.push(bytes.to_vec());
                }
                Operation::Read(buf) => device.fill(buf),
            }
        }
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

#[defmt::global_logger]
struct NoopLogger;

unsafe impl defmt::Logger for NoopLogger {
    fn acquire() {}

    unsafe fn flush() {}

    unsafe fn release() {}

    unsafe fn write(_bytes: &[u8]) {}
}

defmt::timestamp!("{=u32}", 0);
