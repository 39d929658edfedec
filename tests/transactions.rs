//! End-to-end transactions through the reader/dispatcher task pair, with an
//! in-memory stand-in for the serial line.

use std::io::{self, Read, Write};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use cfxlink::{
    DataStore, Link, Matrix, Number, Packet, PacketOps, Realness, Request, StoredValue,
    ValueDescription, ValueStore, VariableCategory,
};

// Reader half of the fake port: blocks briefly like a serial read with the
// inter-byte timeout configured.
struct PortReader {
    rx: Receiver<u8>,
}

impl Read for PortReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.rx.recv_timeout(Duration::from_millis(10)) {
            Ok(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            Err(RecvTimeoutError::Timeout) => Err(io::Error::new(io::ErrorKind::TimedOut, "idle")),
            Err(RecvTimeoutError::Disconnected) => Ok(0),
        }
    }
}

// Writer half of the fake port: every write lands whole on a channel, so
// each received chunk is exactly one emitted frame.
struct PortWriter {
    tx: Sender<Vec<u8>>,
}

impl Write for PortWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(buf.to_vec())
            .map_err(|err| io::Error::new(io::ErrorKind::BrokenPipe, err))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// The calculator side of the link.
struct Calculator {
    to_host: Sender<u8>,
    from_host: Receiver<Vec<u8>>,
}

impl Calculator {
    fn send(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.to_host.send(byte).unwrap();
        }
    }

    fn expect_frame(&self) -> Vec<u8> {
        self.from_host
            .recv_timeout(Duration::from_secs(2))
            .expect("host emitted nothing")
    }

    fn expect_silence(&self) {
        assert_eq!(
            self.from_host.recv_timeout(Duration::from_millis(200)),
            Err(RecvTimeoutError::Timeout)
        );
    }
}

fn start_link(store: DataStore) -> (Calculator, cfxlink::LinkHandle) {
    let (to_host, host_rx) = channel();
    let (host_tx, from_host) = channel();

    let handle = Link::start(
        PortReader { rx: host_rx },
        PortWriter { tx: host_tx },
        store,
    );

    (Calculator { to_host, from_host }, handle)
}

fn request_frame(category: VariableCategory, name: &str) -> Vec<u8> {
    let mut packet = Request::new();
    packet.set_category(category);
    packet.set_variable_name(name);
    packet.as_bytes().to_vec()
}

fn description_frame(
    category: VariableCategory,
    name: &str,
    rows: u8,
    cols: u8,
    realness: Realness,
) -> Vec<u8> {
    let mut packet = ValueDescription::new();
    packet.set_category(category);
    packet.set_variable_name(name);
    packet.set_rowsize(rows);
    packet.set_colsize(cols);
    packet.set_realness(realness);
    packet.as_bytes().to_vec()
}

fn value_frame(row: u8, col: u8, number: Number, realness: Realness) -> Vec<u8> {
    cfxlink::Value::for_cell(row, col, number, realness)
        .unwrap()
        .as_bytes()
        .to_vec()
}

fn end_frame() -> Vec<u8> {
    cfxlink::End::new().as_bytes().to_vec()
}

fn wait_for<F: Fn() -> bool>(pred: F) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !pred() {
        assert!(Instant::now() < deadline, "timed out waiting on the store");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn wakeup_handshake_and_missing_variable() {
    let (calculator, handle) = start_link(DataStore::new());

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    calculator.send(&request_frame(VariableCategory::Variable, "A"));
    assert_eq!(calculator.expect_frame(), [0x06]);

    let end = calculator.expect_frame();
    assert_eq!(&end[..4], b":END".as_ref());
    cfxlink::validate_checksum(&end).unwrap();

    handle.stop();
    handle.join();
}

#[test]
fn receive_complex_scalar() {
    let store = DataStore::new();
    let (calculator, handle) = start_link(store.clone());

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    calculator.send(&description_frame(
        VariableCategory::Variable,
        "A",
        1,
        1,
        Realness::Complex,
    ));
    assert_eq!(calculator.expect_frame(), [0x06]);

    let number = Number::new(1.234567890123, 0.0);
    calculator.send(&value_frame(1, 1, number, Realness::Complex));
    assert_eq!(calculator.expect_frame(), [0x06]);

    calculator.send(&end_frame());

    wait_for(|| store.get(VariableCategory::Variable, "A").is_some());
    assert_eq!(
        store.get(VariableCategory::Variable, "A"),
        Some(StoredValue::new(Matrix::scalar(number), Realness::Complex))
    );

    handle.stop();
    handle.join();
}

#[test]
fn transmit_matrix_row_major() {
    let store = DataStore::new();

    let mut matrix = Matrix::new(2, 2).unwrap();
    for (row, col, v) in [(1, 1, 1.0), (1, 2, 2.0), (2, 1, 3.0), (2, 2, 4.0)] {
        matrix.set(row, col, Number::from_real(v)).unwrap();
    }
    store.put(
        VariableCategory::Matrix,
        "A",
        StoredValue::new(matrix, Realness::Real),
    );

    let (calculator, handle) = start_link(store);

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    calculator.send(&request_frame(VariableCategory::Matrix, "A"));
    assert_eq!(calculator.expect_frame(), [0x06]);

    let description = calculator.expect_frame();
    let description = match Packet::from_bytes(&description).unwrap() {
        Packet::ValueDescription(description) => description,
        other => panic!("expected a variable description, got {other}"),
    };
    assert_eq!(description.rowsize(), 2);
    assert_eq!(description.colsize(), 2);
    assert_eq!(description.realness().unwrap(), Realness::Real);

    let mut cells = Vec::new();
    for _ in 0..4 {
        calculator.send(&[0x06]);

        let frame = calculator.expect_frame();
        let value = Packet::from_bytes(&frame).unwrap().into_value().unwrap();
        cells.push((value.row(), value.col(), value.number().unwrap().real()));
    }
    assert_eq!(cells, [(1, 1, 1.0), (1, 2, 2.0), (2, 1, 3.0), (2, 2, 4.0)]);

    calculator.send(&[0x06]);
    let end = calculator.expect_frame();
    assert_eq!(&end[..4], b":END".as_ref());

    handle.stop();
    handle.join();
}

#[test]
fn corrupt_frame_is_ignored() {
    let (calculator, handle) = start_link(DataStore::new());

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    let mut corrupted = description_frame(VariableCategory::Variable, "A", 1, 1, Realness::Real);
    *corrupted.last_mut().unwrap() ^= 0xff;
    calculator.send(&corrupted);

    // nothing emitted, state unchanged
    calculator.expect_silence();

    // the same description with a good checksum still goes through
    calculator.send(&description_frame(
        VariableCategory::Variable,
        "A",
        1,
        1,
        Realness::Real,
    ));
    assert_eq!(calculator.expect_frame(), [0x06]);

    handle.stop();
    handle.join();
}

#[test]
fn truncated_frame_resets_to_wakeup() {
    let (calculator, handle) = start_link(DataStore::new());

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    // a frame that stops short of its length times out in the framer
    calculator.send(b":REQ\x00VM");
    calculator.expect_silence();

    // the machine is back in wait_for_wakeup: descriptions are ignored,
    // a wakeup is answered
    calculator.send(&description_frame(
        VariableCategory::Variable,
        "A",
        1,
        1,
        Realness::Real,
    ));
    calculator.expect_silence();

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    handle.stop();
    handle.join();
}

#[test]
fn unsupported_screenshot_stream_is_refused() {
    let (calculator, handle) = start_link(DataStore::new());

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    let mut frame = vec![0x3a];
    frame.extend_from_slice(b"DD@");
    frame.resize(50, 0xff);
    calculator.send(&frame);

    calculator.expect_silence();

    handle.stop();
    handle.join();
}

#[test]
fn stop_is_idempotent() {
    let (calculator, handle) = start_link(DataStore::new());

    calculator.send(&[0x15]);
    assert_eq!(calculator.expect_frame(), [0x13]);

    handle.stop();
    handle.stop();
    handle.join();
}
