use core::fmt::Debug;

use embedded_hal::i2c::I2c;

/// Opens an I2C bus device by path.
///
/// The returned bus handle performs the addressed writes and reads; dropping
/// it closes the device. Any `FnMut(&str) -> Result<I2C, E>` is an opener, so
/// tests and custom platforms can pass a closure.
pub trait BusOpener {
    /// Bus handle produced by this opener.
    type Bus: I2c;
    /// Error returned when the device cannot be opened.
    type Error: Debug;

    /// Opens the bus device at `path`.
    fn open(&mut self, path: &str) -> Result<Self::Bus, Self::Error>;
}

impl<F, B, E> BusOpener for F
where
    F: FnMut(&str) -> Result<B, E>,
    B: I2c,
    E: Debug,
{
    type Bus = B;
    type Error = E;

    fn open(&mut self, path: &str) -> Result<B, E> {
        self(path)
    }
}

/// Opens a Linux i2c-dev device such as `/dev/i2c-1`.
#[cfg(feature = "linux")]
pub fn linux_bus(
    path: &str,
) -> Result<linux_embedded_hal::I2cdev, linux_embedded_hal::i2cdev::linux::LinuxI2CError> {
    linux_embedded_hal::I2cdev::new(path)
}
