//! Trait abstraction for HID report I/O to enable testing

use async_trait::async_trait;
use std::io;

/// Trait for report-oriented device I/O
#[async_trait]
pub trait ReportIo: Send {
    /// Read one input report into `buf`
    ///
    /// Returns the report length, or `0` if no report arrived within the
    /// device's read timeout.
    async fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write one output report
    async fn write_report(&mut self, data: &[u8]) -> io::Result<usize>;
}
