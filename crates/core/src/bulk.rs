//! Bulk transfers of 128-byte blobs.
//!
//! Writes: a set command announces the transfer, then the payload follows as
//! 64-byte output reports, zero-padded, with a 20 ms pause after each block.
//! The firmware drops blocks that arrive faster than that.
//!
//! Reads: a get command starts the transfer and the payload arrives later as
//! input reports. The device can only stream one blob at a time, so reads are
//! queued in a [`BulkReader`] and dispatched strictly in submission order. The
//! owner of the transport feeds every input report into
//! [`BulkReader::handle_input_report`]; each request completes through its
//! [`PendingRead`] once enough bytes have arrived.

use crate::command::{self, ids, Args, FRAME_LEN, REPORT_ID};
use crate::error::{Error, Result};
use crate::safety::{self, BLOB_LEN};
use crate::transport::{get_command, set_command, HidTransport};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Size of one output or input report block.
pub const BLOCK_LEN: usize = 0x40;
/// Pause after every output block.
pub const BLOCK_DELAY: Duration = Duration::from_millis(20);

/// Source of the inter-block pause.
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// Pacer that sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Announce a bulk write with `id`/`args`, then stream `data` in blocks.
pub fn write_bulk_data(
    transport: &dyn HidTransport,
    id: u8,
    args: &Args,
    data: &[u8],
    pacer: &dyn Pacer,
) -> Result<()> {
    set_command(transport, id, args)?;
    debug!(
        id = format_args!("0x{:02X}", id),
        len = data.len(),
        blocks = data.len().div_ceil(BLOCK_LEN),
        "Bulk write"
    );

    for chunk in data.chunks(BLOCK_LEN) {
        let mut block = [0u8; BLOCK_LEN];
        block[..chunk.len()].copy_from_slice(chunk);
        transport.send_output_report(&block, REPORT_ID)?;
        pacer.pause(BLOCK_DELAY);
    }
    Ok(())
}

/// Result of a completed bulk read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReply {
    /// Reply frame to the get command that started the transfer.
    pub reply: [u8; FRAME_LEN],
    /// Reassembled payload.
    pub data: Vec<u8>,
}

/// Completion handle for a queued bulk read.
#[derive(Debug)]
pub struct PendingRead {
    rx: oneshot::Receiver<Result<BulkReply>>,
}

impl PendingRead {
    /// Take the outcome if the read has finished.
    ///
    /// Returns `None` while it is still in flight. Once this has returned
    /// `Some`, later calls report [`Error::Cancelled`].
    pub fn try_take(&mut self) -> Option<Result<BulkReply>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(Error::Cancelled)),
        }
    }
}

struct BulkRequest {
    id: u8,
    args: Args,
    reply: [u8; FRAME_LEN],
    data: Vec<u8>,
    cursor: usize,
    done: oneshot::Sender<Result<BulkReply>>,
}

/// FIFO queue of bulk reads. Only the head is ever in flight.
#[derive(Default)]
pub struct BulkReader {
    queue: VecDeque<BulkRequest>,
}

impl BulkReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reads queued, including the one in flight.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue a read of `expected_size` bytes started by get command `id`.
    ///
    /// If nothing else is queued the get command is sent immediately.
    ///
    /// # Panics
    ///
    /// If `id` does not have the get bit set.
    pub fn request(
        &mut self,
        transport: &dyn HidTransport,
        id: u8,
        expected_size: usize,
        args: Args,
    ) -> PendingRead {
        assert!(command::is_get(id), "bulk read 0x{id:02X} lacks the get bit");
        let (done, rx) = oneshot::channel();
        self.queue.push_back(BulkRequest {
            id,
            args,
            reply: [0; FRAME_LEN],
            data: vec![0; expected_size],
            cursor: 0,
            done,
        });
        debug!(
            id = format_args!("0x{:02X}", id),
            expected_size,
            queued = self.queue.len(),
            "Bulk read queued"
        );

        if self.queue.len() == 1 {
            self.dispatch(transport);
        }
        PendingRead { rx }
    }

    /// Feed one input report into the read in flight.
    pub fn handle_input_report(&mut self, transport: &dyn HidTransport, data: &[u8]) {
        let Some(head) = self.queue.front_mut() else {
            trace!(len = data.len(), "Input report with no bulk read in flight");
            return;
        };

        let n = data.len().min(BLOCK_LEN).min(head.data.len() - head.cursor);
        head.data[head.cursor..head.cursor + n].copy_from_slice(&data[..n]);
        head.cursor += n;
        trace!(
            id = format_args!("0x{:02X}", head.id),
            cursor = head.cursor,
            expected = head.data.len(),
            "Bulk block received"
        );

        if head.cursor >= head.data.len() {
            self.complete_head();
            self.dispatch(transport);
        }
    }

    /// Send the get command for the queue head.
    ///
    /// A head whose get command fails is told so and removed, and the next
    /// request is tried, so one failure never stalls the queue.
    fn dispatch(&mut self, transport: &dyn HidTransport) {
        loop {
            let Some(head) = self.queue.front_mut() else {
                return;
            };
            match get_command(transport, head.id, &head.args) {
                Ok(reply) => {
                    head.reply = reply;
                    debug!(id = format_args!("0x{:02X}", head.id), "Bulk read dispatched");
                    if !head.data.is_empty() {
                        return;
                    }
                    self.complete_head();
                }
                Err(e) => {
                    warn!(
                        id = format_args!("0x{:02X}", head.id),
                        error = %e,
                        "Bulk read dispatch failed"
                    );
                    if let Some(failed) = self.queue.pop_front() {
                        let _ = failed.done.send(Err(e));
                    }
                }
            }
        }
    }

    fn complete_head(&mut self) {
        if let Some(done) = self.queue.pop_front() {
            debug!(id = format_args!("0x{:02X}", done.id), "Bulk read complete");
            // The caller may have dropped its handle; that is not an error.
            let _ = done.done.send(Ok(BulkReply {
                reply: done.reply,
                data: done.data,
            }));
        }
    }
}

/// Blob regions reachable through the raw dump commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpRegion {
    /// Config blob (0x8C / 0x0C).
    Config,
    /// Button mapping blob (0x8D / 0x0D).
    Buttons,
    /// Third, unidentified block (0x8F / 0x0F).
    Extra,
}

impl DumpRegion {
    pub const ALL: &'static [DumpRegion] =
        &[DumpRegion::Config, DumpRegion::Buttons, DumpRegion::Extra];

    pub fn read_id(&self) -> u8 {
        match self {
            Self::Config => ids::READ_CONFIG,
            Self::Buttons => ids::READ_BUTTONS,
            Self::Extra => ids::READ_EXTRA,
        }
    }

    pub fn write_id(&self) -> u8 {
        match self {
            Self::Config => ids::WRITE_CONFIG,
            Self::Buttons => ids::WRITE_BUTTONS,
            Self::Extra => ids::WRITE_EXTRA,
        }
    }
}

/// Queue a raw read of one 128-byte blob. `index` is usually a profile id.
pub fn request_blob(
    reader: &mut BulkReader,
    transport: &dyn HidTransport,
    region: DumpRegion,
    index: u8,
) -> PendingRead {
    reader.request(
        transport,
        region.read_id(),
        BLOB_LEN,
        [index, 0, 0, 0, 0, 0],
    )
}

/// Write one raw 128-byte blob.
pub fn write_blob(
    transport: &dyn HidTransport,
    region: DumpRegion,
    index: u8,
    data: &[u8],
    pacer: &dyn Pacer,
) -> Result<()> {
    safety::validate_blob_len(data)?;
    write_bulk_data(
        transport,
        region.write_id(),
        &[index, BLOB_LEN as u8, 0, 0, 0, 0],
        data,
        pacer,
    )
}

/// Pacer for tests that records pauses instead of sleeping.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingPacer {
        pauses: Mutex<Vec<Duration>>,
    }

    impl RecordingPacer {
        pub fn pauses(&self) -> Vec<Duration> {
            self.pauses.lock().unwrap().clone()
        }
    }

    impl Pacer for RecordingPacer {
        fn pause(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }
}
