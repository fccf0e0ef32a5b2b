//! AM2315 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the AM2315 I2C temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Automatic wake-up of the sleeping sensor with bounded retries
//! - CRC-16 (Modbus) checked readings, reported as a flag instead of an error
//! - Designed for `no_std` environments
//! - Optional logging support via `defmt`
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`I2c`] for bus access
//! - [`DelayNs`] for wake and turnaround timing
//!
//! The bus itself is obtained from a [`BusOpener`], which turns a device path
//! into an [`I2c`] handle. Any closure `FnMut(&str) -> Result<I2C, E>` is an
//! opener.
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` and logs wake retries and CRC mismatches
//! - `linux`: Opens `/dev/i2c-N` devices through `linux-embedded-hal`
//!
//! # Example
//!
//! ```ignore
//! use am2315_sensor::{Am2315, DEFAULT_ADDRESS, bus::linux_bus};
//! use linux_embedded_hal::Delay;
//!
//! let mut sensor = Am2315::open(linux_bus, "/dev/i2c-1", DEFAULT_ADDRESS, Delay)?;
//! let measurement = sensor.read_both()?;
//! if measurement.crc_valid {
//!     println!("{} C, {} %RH", measurement.reading.celsius(), measurement.reading.percent());
//! }
//! sensor.close();
//! ```
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`I2c`]: embedded_hal::i2c::I2c
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

pub mod am2315;
pub mod bus;
pub mod crc;
pub mod error;
pub mod sensor;

pub use am2315::{Am2315, Config, DEFAULT_ADDRESS, Measurement, Reading};
pub use bus::BusOpener;
pub use error::{Am2315Error, InitError};
pub use sensor::Sensor;
