use embedded_hal::{delay::DelayNs, i2c::I2c};

use crate::am2315::Am2315;
use crate::bus::BusOpener;
use crate::error::{Am2315Error, InitError};

/// High level AM2315 handle for script bindings and simple callers.
///
/// Every query performs a fresh bus transaction. Use [`channel`](Self::channel)
/// for the cached values of the last read.
pub struct Sensor<I2C, D> {
    channel: Am2315<I2C, D>,
}

impl<I2C, D> Sensor<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Opens the sensor at `address` on the bus device `path`.
    ///
    /// `address` is a plain integer as handed over by scripting callers;
    /// anything outside `0x00..=0x7F`, negative values included, is rejected
    /// before the bus is opened.
    pub fn new<O>(
        opener: O,
        address: i32,
        path: &str,
        delay: D,
    ) -> Result<Self, InitError<I2C::Error>>
    where
        O: BusOpener<Bus = I2C>,
    {
        let address =
            u8::try_from(address).map_err(|_| Am2315Error::<I2C::Error>::AddressOutOfRange)?;
        let channel = Am2315::open(opener, path, address, delay)?;
        Ok(Sensor { channel })
    }

    /// Reads the sensor and returns the temperature in °C.
    pub fn temperature(&mut self) -> Result<f32, Am2315Error<I2C::Error>> {
        Ok(self.channel.read_both()?.reading.celsius())
    }

    /// Reads the sensor and returns the relative humidity in %.
    pub fn humidity(&mut self) -> Result<f32, Am2315Error<I2C::Error>> {
        Ok(self.channel.read_both()?.reading.percent())
    }

    /// Reads the sensor and returns `(temperature, humidity, crc_valid)`.
    pub fn sense(&mut self) -> Result<(f32, f32, bool), Am2315Error<I2C::Error>> {
        self.channel.read_both().map(|m| m.into_triple())
    }

    /// Underlying channel, for cached values and the CRC flag.
    pub fn channel(&self) -> &Am2315<I2C, D> {
        &self.channel
    }

    /// Gives up the facade and returns the channel.
    pub fn into_channel(self) -> Am2315<I2C, D> {
        self.channel
    }
}

#[cfg(feature = "linux")]
impl Sensor<linux_embedded_hal::I2cdev, linux_embedded_hal::Delay> {
    /// Opens the sensor on a Linux i2c-dev device such as `/dev/i2c-1`.
    pub fn open_linux(
        address: i32,
        path: &str,
    ) -> Result<
        Self,
        InitError<<linux_embedded_hal::I2cdev as embedded_hal::i2c::ErrorType>::Error>,
    > {
        Self::new(crate::bus::linux_bus, address, path, linux_embedded_hal::Delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::am2315::DEFAULT_ADDRESS;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTx};

    const ADDR: u8 = DEFAULT_ADDRESS;

    fn opener(i2c: &I2cMock) -> impl FnMut(&str) -> Result<I2cMock, ErrorKind> {
        let i2c = i2c.clone();
        move |_: &str| Ok(i2c.clone())
    }

    fn transaction(frame: [u8; 8]) -> Vec<I2cTx> {
        vec![
            I2cTx::write(ADDR, vec![]),
            I2cTx::write(ADDR, vec![0x03, 0x00, 0x04]),
            I2cTx::read(ADDR, frame.to_vec()),
        ]
    }

    #[test]
    fn test_init_failure_message() {
        let missing = |_: &str| Err::<I2cMock, _>(ErrorKind::Other);
        let err = Sensor::new(missing, 0x5C, "/dev/i2c-9", NoopDelay).err().unwrap();

        assert_eq!(err.cause, Am2315Error::DeviceUnavailable);
        assert_eq!(
            err.to_string(),
            "Cannot initialize sensor. Run program as root and check i2c device / address."
        );
    }

    #[test]
    fn test_init_rejects_script_addresses() {
        for address in [-1, 0x80, 0x100, i32::MAX, i32::MIN] {
            let never_opened = |_: &str| -> Result<I2cMock, ErrorKind> {
                panic!("bus opened for an invalid address")
            };
            let err = Sensor::new(never_opened, address, "/dev/i2c-1", NoopDelay)
                .err()
                .unwrap();
            assert_eq!(err.cause, Am2315Error::AddressOutOfRange);
        }
    }

    #[test]
    fn test_init_wake_timeout() {
        let nack = || {
            I2cTx::write(ADDR, vec![])
                .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        };
        let mut i2c = I2cMock::new(&[nack(), nack(), nack(), nack()]);

        let err = Sensor::new(opener(&i2c), i32::from(ADDR), "/dev/i2c-1", NoopDelay)
            .err()
            .unwrap();
        assert_eq!(err.cause, Am2315Error::WakeTimeout);

        i2c.done();
    }

    #[test]
    fn test_queries_read_fresh_values() {
        let mut expect = vec![I2cTx::write(ADDR, vec![])];
        // Humidity 24.0 %RH, temperature 30.0 C
        expect.extend(transaction([0x03, 0x04, 0x00, 0xF0, 0x01, 0x2C, 0xF1, 0x96]));
        // Humidity 40.0 %RH, temperature 24.6 C
        expect.extend(transaction([0x03, 0x04, 0x01, 0x90, 0x00, 0xF6, 0x70, 0x7F]));
        // Same values, corrupted CRC
        expect.extend(transaction([0x03, 0x04, 0x01, 0x90, 0x00, 0xF6, 0x70, 0x00]));
        let mut i2c = I2cMock::new(&expect);

        let mut sensor =
            Sensor::new(opener(&i2c), i32::from(ADDR), "/dev/i2c-1", NoopDelay).unwrap();

        assert_eq!(sensor.temperature(), Ok(30.0));
        assert_eq!(sensor.humidity(), Ok(40.0));
        assert_eq!(sensor.sense(), Ok((24.6, 40.0, false)));
        assert_eq!(sensor.channel().temperature(), Ok(24.6));

        let mut channel = sensor.into_channel();
        channel.close();

        i2c.done();
    }
}
