#[cfg(not(feature = "std"))]
use alloc::{
    collections::VecDeque,
    string::{String, ToString},
    vec::Vec,
};
#[cfg(feature = "std")]
use std::collections::VecDeque;

use crate::std;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    End, Error, Matrix, Number, Packet, PacketKind, PacketOps, Realness, Result, StoredValue,
    Value, ValueDescription, ValueStore, VariableCategory, ACK, WAKEUP_ACK,
};

/// States of the transaction state machine
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum State {
    /// Freshly constructed, before the unconditional move to [WaitForWakeup](Self::WaitForWakeup)
    Init,
    /// Idle, waiting for the calculator's wakeup byte
    WaitForWakeup,
    /// Wakeup acknowledged, waiting for a request or a description
    WaitForRequestPacket,
    /// Receive transaction opened, about to take the value stream
    StartTransactionRx,
    /// Taking the cells of an incoming value stream
    ReceiveValuePacket,
    /// Transmit transaction opened, about to answer a request
    StartTransactionTx,
    /// Variable description emitted, waiting for its acknowledgement
    SendVariableDescriptionPacket,
    /// Streaming queued value packets
    SendValuePacket,
    /// End emitted, waiting for the next wakeup
    SendEndPacket,
}

impl From<State> for &'static str {
    fn from(state: State) -> Self {
        match state {
            State::Init => "init",
            State::WaitForWakeup => "wait_for_wakeup",
            State::WaitForRequestPacket => "wait_for_request_packet",
            State::StartTransactionRx => "start_transaction_rx",
            State::ReceiveValuePacket => "receive_value_packet",
            State::StartTransactionTx => "start_transaction_tx",
            State::SendVariableDescriptionPacket => "send_variable_description_packet",
            State::SendValuePacket => "send_value_packet",
            State::SendEndPacket => "send_end_packet",
        }
    }
}

impl From<&State> for &'static str {
    fn from(state: &State) -> Self {
        (*state).into()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(self))
    }
}

/// Transfer direction of a transaction, from the host's point of view
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// The calculator is sending a variable to the host
    Receive,
    /// The host is sending a variable to the calculator
    Transmit,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Receive => write!(f, "receive"),
            Self::Transmit => write!(f, "transmit"),
        }
    }
}

/// State of one in-flight transfer
///
/// Created when a request or description opens a transaction, dropped when
/// its stream ends. Owned solely by the dispatcher; no locking involved.
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    direction: Direction,
    category: VariableCategory,
    name: String,
    realness: Realness,
    rowsize: u8,
    colsize: u8,
    expected_count: u16,
    received_count: u16,
    partial: Matrix,
    tx_queue: VecDeque<Vec<u8>>,
}

impl Transaction {
    /// Gets the transfer direction.
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Gets the variable category being transferred.
    pub const fn category(&self) -> VariableCategory {
        self.category
    }

    /// Gets the variable name being transferred.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Gets how many cells the transfer covers.
    pub const fn expected_count(&self) -> u16 {
        self.expected_count
    }

    /// Gets how many cells have arrived so far.
    pub const fn received_count(&self) -> u16 {
        self.received_count
    }
}

/// Transaction state machine for the calculator link
///
/// Consumes decoded packets one at a time and returns the frames to write
/// back; the caller performs all I/O. Generic over the [ValueStore]
/// consulted and updated by transactions, so it runs the same against the
/// shared [DataStore](crate::DataStore) or a test stand-in.
pub struct LinkMachine<S: ValueStore> {
    state: State,
    transaction: Option<Transaction>,
    store: S,
}

impl<S: ValueStore> LinkMachine<S> {
    /// Creates a new [LinkMachine] over a store, ready for a wakeup.
    pub fn new(store: S) -> Self {
        let mut machine = Self {
            state: State::Init,
            transaction: None,
            store,
        };

        machine.reset();

        machine
    }

    /// Gets the current state.
    pub const fn state(&self) -> State {
        self.state
    }

    /// Gets the in-flight transaction, if any.
    pub const fn transaction(&self) -> Option<&Transaction> {
        self.transaction.as_ref()
    }

    /// Gets whether a transaction is in flight.
    pub const fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Gets a reference to the backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Abandons any in-flight transaction and waits for the next wakeup.
    ///
    /// Used by the driver after a transport resync, and by hosts giving up
    /// on a stalled calculator.
    pub fn reset(&mut self) {
        if let Some(txn) = self.transaction.take() {
            log::warn!(
                "abandoning {} transaction for {} {}",
                txn.direction,
                txn.category,
                txn.name
            );
        }

        self.state = State::WaitForWakeup;
    }

    /// Advances the machine with one decoded packet.
    ///
    /// Returns the frames to write to the calculator, in order. A packet
    /// matching no transition guard leaves the state untouched and returns
    /// [Error::GuardViolation].
    pub fn handle(&mut self, packet: &Packet) -> Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();

        self.step(packet, &mut out)?;

        // The ACK that opens a transaction is one we emitted ourselves, so
        // take the implicit transition at once instead of waiting for the
        // calculator's next byte.
        while matches!(
            self.state,
            State::StartTransactionRx | State::StartTransactionTx
        ) {
            self.step(&Packet::Ack, &mut out)?;
        }

        Ok(out)
    }

    fn step(&mut self, packet: &Packet, out: &mut Vec<Vec<u8>>) -> Result<()> {
        match (self.state, packet) {
            (State::WaitForWakeup, Packet::Wakeup) => {
                log::info!("wakeup received, acknowledging");
                out.push([WAKEUP_ACK].to_vec());
                self.state = State::WaitForRequestPacket;
            }

            (State::WaitForRequestPacket, Packet::Request(request)) => {
                let category = request.category()?;
                let name = request.variable_name()?.to_string();

                log::info!("calculator requests {category} {name}");

                self.transaction = Some(Transaction {
                    direction: Direction::Transmit,
                    category,
                    name,
                    realness: Realness::Real,
                    rowsize: 1,
                    colsize: 1,
                    expected_count: 0,
                    received_count: 0,
                    partial: Matrix::scalar(Number::default()),
                    tx_queue: VecDeque::new(),
                });

                out.push([ACK].to_vec());
                self.state = State::StartTransactionTx;
            }

            (State::WaitForRequestPacket, Packet::ValueDescription(description)) => {
                let category = description.category()?;
                let name = description.variable_name()?.to_string();
                let realness = description.realness()?;
                let (rowsize, colsize) = (description.rowsize(), description.colsize());
                let partial = Matrix::new(rowsize, colsize)?;

                log::info!("calculator sends {description}");

                self.transaction = Some(Transaction {
                    direction: Direction::Receive,
                    category,
                    name,
                    realness,
                    rowsize,
                    colsize,
                    expected_count: rowsize as u16 * colsize as u16,
                    received_count: 0,
                    partial,
                    tx_queue: VecDeque::new(),
                });

                out.push([ACK].to_vec());
                self.state = State::StartTransactionRx;
            }

            (State::StartTransactionRx, Packet::Ack) => {
                self.state = State::ReceiveValuePacket;
            }

            (State::StartTransactionTx, Packet::Ack) => {
                self.begin_transmit(out);
            }

            (State::ReceiveValuePacket, Packet::Value(value)) => {
                let txn = match self.transaction.as_mut() {
                    Some(txn) => txn,
                    None => {
                        return Err(Error::GuardViolation {
                            state: State::ReceiveValuePacket,
                            kind: PacketKind::Value,
                        })
                    }
                };

                if txn.received_count + 1 > txn.expected_count {
                    return Err(Error::GuardViolation {
                        state: State::ReceiveValuePacket,
                        kind: PacketKind::Value,
                    });
                }

                let number = value.number()?;

                // a complex cell inside a REAL-announced stream would break
                // the realness invariant of the stored value
                if txn.realness == Realness::Real && number.is_complex() {
                    return Err(Error::GuardViolation {
                        state: State::ReceiveValuePacket,
                        kind: PacketKind::Value,
                    });
                }

                txn.partial.set(value.row(), value.col(), number)?;
                txn.received_count += 1;

                log::debug!(
                    "cell ({}, {}) stored, {}/{} received",
                    value.row(),
                    value.col(),
                    txn.received_count,
                    txn.expected_count
                );

                out.push([ACK].to_vec());
            }

            (State::ReceiveValuePacket, Packet::End(_)) => {
                self.commit_receive();
                self.state = State::WaitForWakeup;
            }

            (State::SendVariableDescriptionPacket, Packet::Ack) => {
                self.emit_next_value(out);
            }

            (State::SendValuePacket, Packet::Ack) => {
                self.emit_next_value(out);
            }

            (State::SendEndPacket, Packet::Wakeup) => {
                out.push([WAKEUP_ACK].to_vec());
                self.state = State::WaitForRequestPacket;
            }

            (state, packet) => {
                return Err(Error::GuardViolation {
                    state,
                    kind: packet.kind(),
                });
            }
        }

        Ok(())
    }

    // Answers the acknowledged request: looks the variable up and streams
    // its description, or a bare END when the name is unknown or the value
    // cannot be encoded.
    fn begin_transmit(&mut self, out: &mut Vec<Vec<u8>>) {
        let (category, name) = match self.transaction.as_ref() {
            Some(txn) => (txn.category, txn.name.clone()),
            None => {
                out.push(end_frame());
                self.state = State::SendEndPacket;
                return;
            }
        };

        match self.store.get(category, &name) {
            None => {
                log::warn!("{}, answering with END", Error::NotFound { category, name });
                self.transaction = None;
                out.push(end_frame());
                self.state = State::SendEndPacket;
            }
            Some(stored) => match build_stream(category, &name, &stored) {
                Ok((description, tx_queue)) => {
                    if let Some(txn) = self.transaction.as_mut() {
                        txn.realness = stored.realness;
                        txn.rowsize = stored.value.rows();
                        txn.colsize = stored.value.cols();
                        txn.expected_count = stored.value.cell_count();
                        txn.tx_queue = tx_queue;
                    }

                    out.push(description);
                    self.state = State::SendVariableDescriptionPacket;
                }
                Err(err) => {
                    log::error!("failed to encode {category} {name}: {err}, answering with END");
                    self.transaction = None;
                    out.push(end_frame());
                    self.state = State::SendEndPacket;
                }
            },
        }
    }

    // Emits the next queued value frame, or END once the queue is dry.
    fn emit_next_value(&mut self, out: &mut Vec<Vec<u8>>) {
        let frame = self
            .transaction
            .as_mut()
            .and_then(|txn| txn.tx_queue.pop_front());

        match frame {
            Some(frame) => {
                out.push(frame);
                self.state = State::SendValuePacket;
            }
            None => {
                if let Some(txn) = self.transaction.take() {
                    log::info!("{} {} sent, ending stream", txn.category, txn.name);
                }

                out.push(end_frame());
                self.state = State::SendEndPacket;
            }
        }
    }

    // Commits a completed receive into the store. A stream that ended short
    // of the announced cell count is dropped.
    fn commit_receive(&mut self) {
        if let Some(txn) = self.transaction.take() {
            if txn.received_count == txn.expected_count {
                log::info!(
                    "storing {} {} ({}x{}, {})",
                    txn.category,
                    txn.name,
                    txn.rowsize,
                    txn.colsize,
                    txn.realness
                );

                self.store
                    .put(txn.category, &txn.name, StoredValue::new(txn.partial, txn.realness));
            } else {
                log::warn!(
                    "stream for {} {} ended after {}/{} cells, dropping",
                    txn.category,
                    txn.name,
                    txn.received_count,
                    txn.expected_count
                );
            }
        }
    }
}

// The whole outgoing stream for a stored value: its description frame and
// one value frame per cell, in row-major order.
fn build_stream(
    category: VariableCategory,
    name: &str,
    stored: &StoredValue,
) -> Result<(Vec<u8>, VecDeque<Vec<u8>>)> {
    let mut description = ValueDescription::new();
    description.set_category(category);
    description.set_variable_name(name);
    description.set_rowsize(stored.value.rows());
    description.set_colsize(stored.value.cols());
    description.set_realness(stored.realness);

    let mut tx_queue = VecDeque::new();
    for (row, col, number) in stored.value.iter() {
        let mut value = Value::for_cell(row, col, number, stored.realness)?;
        tx_queue.push_back(value.as_bytes().to_vec());
    }

    Ok((description.as_bytes().to_vec(), tx_queue))
}

fn end_frame() -> Vec<u8> {
    End::new().as_bytes().to_vec()
}
