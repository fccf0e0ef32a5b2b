use core::fmt::Debug;

/// Possible errors from the AM2315 driver.
///
/// `E` is the error type of the underlying I2C bus.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum Am2315Error<E: Debug> {
    /// The bus device could not be opened.
    #[error("i2c bus device unavailable")]
    DeviceUnavailable,
    /// The address is not a valid 7-bit I2C address.
    #[error("i2c address out of range (0x00..=0x7f)")]
    AddressOutOfRange,
    /// The sensor did not acknowledge any wake attempt.
    #[error("sensor did not wake up")]
    WakeTimeout,
    /// Error from the I2C bus during a transaction.
    #[error("i2c bus error: {0:?}")]
    Bus(E),
    /// The channel has been closed.
    #[error("sensor channel is closed")]
    NotOpen,
    /// No measurement has been read yet.
    #[error("no reading available yet")]
    NoReadingYet,
}

impl<E: Debug> From<E> for Am2315Error<E> {
    fn from(value: E) -> Self {
        Self::Bus(value)
    }
}

/// Construction failure of a [`Sensor`](crate::Sensor).
///
/// Displays the message existing callers match on; the underlying error is
/// kept in `cause`.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Cannot initialize sensor. Run program as root and check i2c device / address.")]
pub struct InitError<E: Debug> {
    /// Error that made the construction fail.
    pub cause: Am2315Error<E>,
}

impl<E: Debug> From<Am2315Error<E>> for InitError<E> {
    fn from(cause: Am2315Error<E>) -> Self {
        InitError { cause }
    }
}
