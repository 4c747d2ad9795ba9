//! hidapi transport and the run loop that feeds input reports to the core.

use std::ffi::CString;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use tm155_core::bulk::{BulkReader, BulkReply, PendingRead, BLOCK_LEN};
use tm155_core::command::FRAME_LEN;
use tm155_core::device::{self, DeviceInfo};
use tm155_core::error::Result as CoreResult;
use tm155_core::transport::HidTransport;
use tm155_core::{profile, system};
use tracing::{debug, trace};

/// How long one input poll blocks before the deadline is checked again.
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Something input reports can be read from.
pub trait InputSource {
    /// Read one input report, or `None` if nothing arrived within `timeout`.
    fn read_input(&self, timeout: Duration) -> CoreResult<Option<Vec<u8>>>;
}

/// A TM155 HID interface opened through hidapi.
pub struct CliHidTransport {
    device: hidapi::HidDevice,
}

impl CliHidTransport {
    pub fn open(api: &hidapi::HidApi, info: &DeviceInfo) -> Result<Self> {
        let path = CString::new(info.path.as_str())
            .with_context(|| format!("device path {:?}", info.path))?;
        let device = api
            .open_path(&path)
            .with_context(|| format!("open HID device {}", info.path))?;
        debug!(path = %info.path, interface = ?info.interface, "Opened interface");
        Ok(Self { device })
    }
}

fn with_report_id(report_id: u8, data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(data.len() + 1);
    buf.push(report_id);
    buf.extend_from_slice(data);
    buf
}

impl HidTransport for CliHidTransport {
    fn send_feature_report(&self, data: &[u8], report_id: u8) -> CoreResult<()> {
        self.device
            .send_feature_report(&with_report_id(report_id, data))?;
        Ok(())
    }

    fn get_feature_report(&self, report_id: u8) -> CoreResult<Vec<u8>> {
        let mut buf = [0u8; FRAME_LEN + 1];
        buf[0] = report_id;
        let n = self.device.get_feature_report(&mut buf)?;
        // hidapi counts the report id byte it leaves at the front
        Ok(buf[1..n.clamp(1, buf.len())].to_vec())
    }

    fn send_output_report(&self, data: &[u8], report_id: u8) -> CoreResult<()> {
        self.device.write(&with_report_id(report_id, data))?;
        Ok(())
    }
}

impl InputSource for CliHidTransport {
    fn read_input(&self, timeout: Duration) -> CoreResult<Option<Vec<u8>>> {
        let mut buf = [0u8; BLOCK_LEN];
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        let n = self.device.read_timeout(&mut buf, millis)?;
        Ok((n > 0).then(|| buf[..n].to_vec()))
    }
}

/// Feed input reports into `reader` until `pending` finishes or `timeout`
/// passes.
pub fn wait_for<T: HidTransport + InputSource>(
    transport: &T,
    reader: &mut BulkReader,
    mut pending: PendingRead,
    timeout: Duration,
) -> Result<BulkReply> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(outcome) = pending.try_take() {
            return Ok(outcome?);
        }
        let now = Instant::now();
        if now >= deadline {
            bail!(
                "bulk read timed out after {} ms ({} request(s) still queued)",
                timeout.as_millis(),
                reader.pending()
            );
        }
        if let Some(report) = transport.read_input(INPUT_POLL.min(deadline - now))? {
            trace!(len = report.len(), "Input report");
            reader.handle_input_report(transport, &report);
        }
    }
}

/// An open control interface plus its bulk read queue.
pub struct Session<T> {
    pub transport: T,
    pub reader: BulkReader,
    pub timeout: Duration,
}

impl<T: HidTransport + InputSource> Session<T> {
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self {
            transport,
            reader: BulkReader::new(),
            timeout,
        }
    }

    /// Wait for a queued bulk read.
    pub fn wait(&mut self, pending: PendingRead) -> Result<BulkReply> {
        wait_for(&self.transport, &mut self.reader, pending, self.timeout)
    }

    /// The profile to operate on: the one given, or the active one.
    pub fn resolve_profile(&self, profile_id: Option<u8>) -> Result<u8> {
        match profile_id {
            Some(id) => Ok(id),
            None => Ok(profile::read_active_profile(&self.transport)?),
        }
    }
}

impl Session<CliHidTransport> {
    /// Find the mouse, open its control interface and take host control.
    pub fn connect(timeout: Duration) -> Result<Self> {
        let devices = device::discover_devices()?;
        let control = device::find_control_interface(&devices)?;
        let api = hidapi::HidApi::new().map_err(|e| anyhow!("hidapi init: {e}"))?;
        let transport = CliHidTransport::open(&api, control)?;
        system::claim_host_control(&transport)?;
        Ok(Self::new(transport, timeout))
    }
}
