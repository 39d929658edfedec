use std::time::Duration;

use serialport::{DataBits, Parity, SerialPort, StopBits};

use crate::Result;

/// Line rate of the calculator link.
pub const BAUD_RATE: u32 = 9_600;

/// Idle gap marking a frame boundary on the wire; doubles as the read
/// timeout so the framer can spot truncated frames.
pub const INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(50);

/// Opens and configures the serial port for the calculator link:
/// 9600 baud, eight data bits, no parity, two stop bits, DTR asserted and
/// RTS deasserted.
///
/// Returns separate handles for the reader and dispatcher tasks; pass them
/// to [Link::start](crate::Link::start).
pub fn open(path: &str) -> Result<(Box<dyn SerialPort>, Box<dyn SerialPort>)> {
    let mut port = serialport::new(path, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::Two)
        .timeout(INTER_BYTE_TIMEOUT)
        .open()?;

    port.write_data_terminal_ready(true)?;
    port.write_request_to_send(false)?;

    let writer = port.try_clone()?;

    Ok((port, writer))
}
