use embedded_hal::{
    delay::DelayNs,
    i2c::{Error as _, ErrorKind, I2c},
};

use crate::bus::BusOpener;
use crate::crc;
use crate::error::Am2315Error;

/// Factory I2C address of the AM2315.
pub const DEFAULT_ADDRESS: u8 = 0x5C;

/// Highest 7-bit I2C address.
const MAX_ADDRESS: u8 = 0x7F;

/// Modbus-style function code: read registers.
const READ_REGISTERS: u8 = 0x03;
/// First register of the humidity/temperature block.
const HUMIDITY_REGISTER: u8 = 0x00;
/// Humidity (2 bytes) followed by temperature (2 bytes).
const REGISTER_COUNT: u8 = 4;
/// Function code, byte count, 4 data bytes and a 2 byte CRC.
const RESPONSE_LEN: usize = 8;

/// Timing used for the wake sequence and the read transaction.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct Config {
    /// Wake attempts after the initial dummy write.
    pub wake_retries: u8,
    /// Retry `n` waits `n * wake_backoff_ms` milliseconds first.
    pub wake_backoff_ms: u32,
    /// Wait between the read command and reading the response.
    pub turnaround_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            wake_retries: 3,
            wake_backoff_ms: 1,
            turnaround_ms: 2,
        }
    }
}

/// Reading decoded from the AM2315 registers, in fixed point.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    /// Temperature in tenths of a degree Celsius.
    pub temperature: i16,
    /// Relative humidity in tenths of a percent.
    pub relative_humidity: u16,
}

impl Reading {
    /// Temperature in degrees Celsius.
    pub fn celsius(&self) -> f32 {
        f32::from(self.temperature) / 10.0
    }

    /// Relative humidity in percent.
    pub fn percent(&self) -> f32 {
        f32::from(self.relative_humidity) / 10.0
    }
}

/// Result of one read transaction.
///
/// A CRC mismatch is not an error: the decoded values are returned anyway and
/// the caller decides whether to discard them.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurement {
    /// Decoded humidity and temperature.
    pub reading: Reading,
    /// Whether the response CRC matched the received data.
    pub crc_valid: bool,
}

impl Measurement {
    /// `(temperature °C, humidity %RH, crc_valid)`.
    pub fn into_triple(self) -> (f32, f32, bool) {
        (self.reading.celsius(), self.reading.percent(), self.crc_valid)
    }
}

/// Channel to one AM2315 sensor.
///
/// Owns the bus handle from [`open`](Self::open) until [`close`](Self::close)
/// or drop. Two channels must not be opened on the same physical sensor.
pub struct Am2315<I2C, D> {
    i2c: Option<I2C>,
    address: u8,
    delay: D,
    config: Config,
    last: Option<Measurement>,
}

impl<I2C, D> Am2315<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Opens the bus at `path` and wakes the sensor at `address`.
    ///
    /// # Errors
    ///
    /// * `AddressOutOfRange` if `address` is above `0x7F`; the bus is not touched.
    /// * `DeviceUnavailable` if `opener` cannot open `path`. The opener's own
    ///   error is logged with the `defmt` feature and otherwise dropped.
    /// * `WakeTimeout` if the sensor never acknowledges the wake sequence.
    /// * `Bus` if the wake write fails with anything other than a NACK.
    pub fn open<O>(
        opener: O,
        path: &str,
        address: u8,
        delay: D,
    ) -> Result<Self, Am2315Error<I2C::Error>>
    where
        O: BusOpener<Bus = I2C>,
    {
        Self::open_with_config(opener, path, address, delay, Config::default())
    }

    /// Like [`open`](Self::open) with explicit timing.
    pub fn open_with_config<O>(
        mut opener: O,
        path: &str,
        address: u8,
        delay: D,
        config: Config,
    ) -> Result<Self, Am2315Error<I2C::Error>>
    where
        O: BusOpener<Bus = I2C>,
    {
        if address > MAX_ADDRESS {
            return Err(Am2315Error::AddressOutOfRange);
        }

        // The opener's error type differs per platform, so it is only logged.
        let i2c = opener.open(path).map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "am2315: cannot open bus device {=str}: {:?}",
                path,
                defmt::Debug2Format(&_e)
            );
            Am2315Error::<I2C::Error>::DeviceUnavailable
        })?;

        let mut sensor = Am2315 {
            i2c: Some(i2c),
            address,
            delay,
            config,
            last: None,
        };
        sensor.wake()?;
        Ok(sensor)
    }

    /// Reads humidity and temperature in one transaction.
    ///
    /// The measurement is cached for [`temperature`](Self::temperature) and
    /// [`humidity`](Self::humidity), whether or not its CRC matched.
    ///
    /// # Errors
    ///
    /// * `NotOpen` after [`close`](Self::close).
    /// * `WakeTimeout` if the sensor cannot be woken.
    /// * `Bus` if a wake write fails with anything other than a NACK, or if
    ///   writing the command or reading the response fails.
    pub fn read_both(&mut self) -> Result<Measurement, Am2315Error<I2C::Error>> {
        self.wake()?;

        let i2c = self.i2c.as_mut().ok_or(Am2315Error::<I2C::Error>::NotOpen)?;
        i2c.write(
            self.address,
            &[READ_REGISTERS, HUMIDITY_REGISTER, REGISTER_COUNT],
        )?;
        self.delay.delay_ms(self.config.turnaround_ms);

        let mut frame = [0; RESPONSE_LEN];
        i2c.read(self.address, &mut frame)?;

        let measurement = decode(&frame);
        if !measurement.crc_valid {
            #[cfg(feature = "defmt")]
            defmt::warn!("am2315: CRC mismatch in response {:#x}", frame);
        }

        self.last = Some(measurement);
        Ok(measurement)
    }

    /// Temperature in °C from the last read, without touching the bus.
    pub fn temperature(&self) -> Result<f32, Am2315Error<I2C::Error>> {
        self.last
            .map(|m| m.reading.celsius())
            .ok_or(Am2315Error::NoReadingYet)
    }

    /// Relative humidity in % from the last read, without touching the bus.
    pub fn humidity(&self) -> Result<f32, Am2315Error<I2C::Error>> {
        self.last
            .map(|m| m.reading.percent())
            .ok_or(Am2315Error::NoReadingYet)
    }

    /// Last measurement returned by [`read_both`](Self::read_both), if any.
    pub fn last_measurement(&self) -> Option<Measurement> {
        self.last
    }

    /// 7-bit I2C address of the sensor.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Whether the channel still holds its bus handle.
    pub fn is_open(&self) -> bool {
        self.i2c.is_some()
    }

    /// Releases the bus. Closing a closed channel does nothing.
    pub fn close(&mut self) {
        if self.i2c.take().is_some() {
            #[cfg(feature = "defmt")]
            defmt::debug!("am2315: closed channel to {=u8:#x}", self.address);
        }
    }

    /// Wakes the sensor from sleep.
    ///
    /// A sleeping AM2315 does not acknowledge the first transaction, so a
    /// dummy write is sent and retried with a growing delay until it is
    /// acknowledged.
    fn wake(&mut self) -> Result<(), Am2315Error<I2C::Error>> {
        let i2c = self.i2c.as_mut().ok_or(Am2315Error::<I2C::Error>::NotOpen)?;

        if dummy_write(i2c, self.address)? {
            return Ok(());
        }

        for attempt in 1..=self.config.wake_retries {
            self.delay
                .delay_ms(u32::from(attempt) * self.config.wake_backoff_ms);
            if dummy_write(i2c, self.address)? {
                #[cfg(feature = "defmt")]
                defmt::debug!("am2315: awake after {=u8} retries", attempt);
                return Ok(());
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "am2315: no answer from {=u8:#x} after {=u8} wake retries",
            self.address,
            self.config.wake_retries
        );
        Err(Am2315Error::WakeTimeout)
    }
}

/// Sends an empty write to `address`.
///
/// Returns `Ok(false)` when the sensor did not acknowledge, which is how a
/// sleeping AM2315 answers. Any other bus error is returned as `Bus`.
fn dummy_write<I2C: I2c>(
    i2c: &mut I2C,
    address: u8,
) -> Result<bool, Am2315Error<I2C::Error>> {
    match i2c.write(address, &[]) {
        Ok(()) => Ok(true),
        Err(e) if matches!(e.kind(), ErrorKind::NoAcknowledge(_)) => Ok(false),
        Err(e) => Err(Am2315Error::Bus(e)),
    }
}

/// Decodes a response frame and checks its CRC.
fn decode(frame: &[u8; RESPONSE_LEN]) -> Measurement {
    let [_function, _count, hum_hi, hum_lo, temp_hi, temp_lo, _, _] = *frame;

    let relative_humidity = u16::from_be_bytes([hum_hi, hum_lo]);

    // Sign and magnitude, not two's complement.
    let is_temp_negative = (temp_hi >> 7) != 0;
    let magnitude = u16::from_be_bytes([temp_hi & 0b0111_1111, temp_lo]) as i16;
    let temperature = if is_temp_negative {
        -magnitude
    } else {
        magnitude
    };

    Measurement {
        reading: Reading {
            temperature,
            relative_humidity,
        },
        crc_valid: crc::verify_frame(frame),
    }
}
