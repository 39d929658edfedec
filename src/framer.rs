use std::io::{self, Read};

use crate::{index, len, Error, Packet, PacketTag, Result, ACK, PACKET_START, WAKEUP, WAKEUP_ACK};

/// Assembles raw transport bytes into whole frames
///
/// The byte source must read with a short timeout (about the 50 ms
/// inter-byte gap of the wire). A timeout at a frame boundary is an idle
/// tick; a timeout inside a frame surfaces [Error::TruncatedFrame], which
/// the driver treats as a transport resync.
pub struct Framer<R> {
    port: R,
}

impl<R: Read> Framer<R> {
    /// Creates a new [Framer] over a byte source.
    pub fn new(port: R) -> Self {
        Self { port }
    }

    /// Consumes the framer, returning the byte source.
    pub fn into_inner(self) -> R {
        self.port
    }

    /// Reads one whole frame.
    ///
    /// Returns `Ok(None)` when the line is idle. Single control bytes
    /// complete immediately; `:`-led frames are sized by their tag, with
    /// value packets sized by the complex flag of the sign-info byte.
    pub fn read_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let first = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };

        match first {
            WAKEUP | ACK | WAKEUP_ACK => Ok(Some([first].to_vec())),
            PACKET_START => {
                let mut frame = Vec::with_capacity(len::MAX_FRAME);
                frame.push(first);

                self.fill(&mut frame, index::TAG_END)?;

                let tag = [frame[index::TAG], frame[index::TAG + 1], frame[index::TAG + 2]];
                match PacketTag::from(&tag).frame_len() {
                    Some(frame_len) => self.fill(&mut frame, frame_len)?,
                    None => {
                        self.fill(&mut frame, len::VALUE_HEADER)?;

                        let frame_len = if Packet::value_frame_is_complex(frame.as_ref()) {
                            len::COMPLEX_VALUE
                        } else {
                            len::REAL_VALUE
                        };
                        self.fill(&mut frame, frame_len)?;
                    }
                }

                Ok(Some(frame))
            }
            byte => {
                log::trace!("discarding stray byte: {byte:#04x}");
                Ok(None)
            }
        }
    }

    // One byte, or `None` on an idle timeout.
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(byte.as_mut()) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => return Ok(None),
                Err(err) => return Err(err.into()),
            }
        }
    }

    // Extends the frame to `total` bytes; going idle here is a truncation.
    fn fill(&mut self, frame: &mut Vec<u8>, total: usize) -> Result<()> {
        let mut byte = [0u8; 1];

        while frame.len() < total {
            match self.port.read(byte.as_mut()) {
                Ok(0) => return Err(Error::TruncatedFrame { len: frame.len() }),
                Ok(_) => frame.push(byte[0]),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_timeout(&err) => {
                    return Err(Error::TruncatedFrame { len: frame.len() })
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(())
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Number, PacketOps, Realness, Request, Value, VariableCategory};

    // Yields scripted bytes, then times out forever like an idle line.
    struct ScriptedPort {
        data: Vec<u8>,
        pos: usize,
    }

    impl ScriptedPort {
        fn new(data: &[u8]) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.get(self.pos) {
                Some(&byte) => {
                    buf[0] = byte;
                    self.pos += 1;
                    Ok(1)
                }
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "idle")),
            }
        }
    }

    #[test]
    fn test_control_byte_frames() -> Result<()> {
        let mut framer = Framer::new(ScriptedPort::new(&[0x15, 0x06, 0x13]));

        assert_eq!(framer.read_frame()?, Some([0x15].to_vec()));
        assert_eq!(framer.read_frame()?, Some([0x06].to_vec()));
        assert_eq!(framer.read_frame()?, Some([0x13].to_vec()));
        assert_eq!(framer.read_frame()?, None);

        Ok(())
    }

    #[test]
    fn test_tagged_frame() -> Result<()> {
        let mut request = Request::new();
        request.set_category(VariableCategory::Variable);
        request.set_variable_name("A");

        let mut framer = Framer::new(ScriptedPort::new(request.as_bytes()));

        let frame = framer.read_frame()?.unwrap();
        assert_eq!(frame.len(), len::REQUEST);
        assert_eq!(frame.as_slice(), request.as_bytes_unchecked());

        Ok(())
    }

    #[test]
    fn test_value_frame_lengths() -> Result<()> {
        let mut real = Value::for_cell(1, 1, Number::from_real(1.5), Realness::Real)?;
        let mut complex = Value::for_cell(1, 1, Number::new(1.0, -1.0), Realness::Complex)?;

        let mut bytes = real.as_bytes().to_vec();
        bytes.extend_from_slice(complex.as_bytes());

        let mut framer = Framer::new(ScriptedPort::new(bytes.as_ref()));

        assert_eq!(framer.read_frame()?.unwrap().len(), len::REAL_VALUE);
        assert_eq!(framer.read_frame()?.unwrap().len(), len::COMPLEX_VALUE);

        Ok(())
    }

    #[test]
    fn test_truncated_frame() {
        let mut framer = Framer::new(ScriptedPort::new(b":REQ\x00VM"));

        assert_eq!(
            framer.read_frame(),
            Err(Error::TruncatedFrame { len: 7 })
        );
    }

    #[test]
    fn test_stray_bytes_skipped() -> Result<()> {
        let mut framer = Framer::new(ScriptedPort::new(&[0x00, 0xff]));

        assert_eq!(framer.read_frame()?, None);
        assert_eq!(framer.read_frame()?, None);
        assert_eq!(framer.read_frame()?, None);

        Ok(())
    }
}
