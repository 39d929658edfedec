use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::{cfx_log_level, DataStore, Error, Framer, LinkMachine, Packet};

/// Depth of the bounded queue between the reader and the dispatcher.
pub const QUEUE_DEPTH: usize = 16;

// Events the reader hands to the dispatcher, in arrival order.
enum ReaderEvent {
    /// A decoded packet
    Packet(Packet),
    /// The transport lost frame sync; the machine returns to wait_for_wakeup
    Resync,
}

/// Entry point starting the two link tasks over a byte transport.
///
/// The reader task blocks on the byte source, frames and decodes packets,
/// and feeds a bounded queue. The dispatcher task drains the queue, drives
/// a [LinkMachine] over the shared [DataStore], and owns every transport
/// write, flushing before it returns to the queue.
pub struct Link;

impl Link {
    /// Starts the reader and dispatcher tasks.
    ///
    /// Reads from `port_reader` must time out at roughly the inter-byte
    /// gap; both the framer and the stop signal depend on it. Use
    /// [serial::open](crate::serial::open) to get conforming halves of a
    /// real port.
    ///
    /// When the [ENV_LOG_LEVEL](crate::ENV_LOG_LEVEL) environment variable
    /// is set, its level is applied to the log facade before the tasks
    /// start.
    pub fn start<R, W>(port_reader: R, port_writer: W, store: DataStore) -> LinkHandle
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        if let Some(level) = cfx_log_level() {
            log::set_max_level(level.into());
        }

        let stop = Arc::new(AtomicBool::new(false));
        let abort = Arc::new(AtomicBool::new(false));
        let (queue_tx, queue_rx) = sync_channel(QUEUE_DEPTH);

        let reader_stop = Arc::clone(&stop);
        let reader = thread::spawn(move || read_task(port_reader, queue_tx, reader_stop));

        let dispatcher_abort = Arc::clone(&abort);
        let dispatcher =
            thread::spawn(move || dispatch_task(port_writer, queue_rx, store, dispatcher_abort));

        LinkHandle {
            stop,
            abort,
            reader: Some(reader),
            dispatcher: Some(dispatcher),
        }
    }
}

/// Handle to a running [Link]
pub struct LinkHandle {
    stop: Arc<AtomicBool>,
    abort: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl LinkHandle {
    /// Signals the link tasks to stop.
    ///
    /// The first call is graceful: the reader exits after its current read
    /// and the dispatcher drains whatever is already queued. A second call
    /// aborts, dropping queued packets and any in-flight transaction.
    pub fn stop(&self) {
        if self.stop.swap(true, Ordering::SeqCst) {
            self.abort.store(true, Ordering::SeqCst);
        }
    }

    /// Waits for both tasks to exit.
    pub fn join(mut self) {
        for task in [self.reader.take(), self.dispatcher.take()]
            .into_iter()
            .flatten()
        {
            let _ = task.join();
        }
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn read_task<R: Read>(port: R, queue: SyncSender<ReaderEvent>, stop: Arc<AtomicBool>) {
    let mut framer = Framer::new(port);

    while !stop.load(Ordering::SeqCst) {
        let event = match framer.read_frame() {
            Ok(None) => continue,
            Ok(Some(frame)) => match Packet::from_bytes(frame.as_ref()) {
                Ok(packet) => ReaderEvent::Packet(packet),
                Err(err) => {
                    log::error!("discarding frame: {err}");
                    continue;
                }
            },
            Err(err @ Error::TruncatedFrame { .. }) => {
                log::warn!("{err}, resynchronizing");
                ReaderEvent::Resync
            }
            Err(err) => {
                log::error!("transport read failed: {err}");
                break;
            }
        };

        if queue.send(event).is_err() {
            break;
        }
    }
}

fn dispatch_task<W: Write>(
    mut port: W,
    queue: Receiver<ReaderEvent>,
    store: DataStore,
    abort: Arc<AtomicBool>,
) {
    let mut machine = LinkMachine::new(store);

    // recv fails once the reader is gone and the queue has drained
    while let Ok(event) = queue.recv() {
        if abort.load(Ordering::SeqCst) {
            log::warn!("aborting with packets still queued");
            break;
        }

        let packet = match event {
            ReaderEvent::Resync => {
                machine.reset();
                continue;
            }
            ReaderEvent::Packet(packet) => packet,
        };

        match machine.handle(&packet) {
            Ok(frames) => {
                for frame in &frames {
                    if let Err(err) = port.write_all(frame.as_ref()) {
                        log::error!("transport write failed: {err}");
                        return;
                    }
                }

                if let Err(err) = port.flush() {
                    log::error!("transport flush failed: {err}");
                    return;
                }
            }
            Err(err @ Error::GuardViolation { .. }) => log::debug!("discarding packet: {err}"),
            Err(err) => log::error!("discarding packet: {err}"),
        }
    }

    if machine.in_transaction() {
        log::warn!("link stopped mid-transaction");
    }
}
