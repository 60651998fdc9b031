// ── Frame capture front-end ──
//
// Opens the mirrored adapter in promiscuous mode with the TZSP filter
// installed and yields raw frames to the pipeline. Setup failures are
// fatal; per-frame decode failures are counted drops.

mod classifier;
mod pipeline;
pub mod tzsp;

pub use classifier::Classifier;
pub use pipeline::{BatchMap, CapturePipeline};

use pcap::{Active, Capture};
use tracing::info;

use crate::config::CaptureConfig;
use crate::error::CoreError;

/// BPF filter matching TZSP mirror traffic.
pub const TZSP_FILTER: &str = "udp port 37008";

/// Live capture handle over the monitored adapter.
pub struct FrameCapture {
    handle: Capture<Active>,
}

impl FrameCapture {
    /// Open the adapter and install the TZSP filter.
    pub fn open(config: &CaptureConfig) -> Result<Self, CoreError> {
        let mut handle = Capture::from_device(config.adapter.as_str())?
            .promisc(true)
            .snaplen(config.snap_len as i32)
            .timeout(config.read_timeout_ms as i32)
            .open()?;
        info!(adapter = %config.adapter, "network adapter opened");

        handle.filter(TZSP_FILTER, true)?;
        info!(filter = TZSP_FILTER, "capture filter applied");

        Ok(Self { handle })
    }

    /// Blocking read of the next frame.
    ///
    /// `Ok(None)` signals the adapter read timeout elapsed with no frame;
    /// the caller uses those wake-ups to flush its batch window.
    pub fn next_frame(&mut self) -> Result<Option<&[u8]>, CoreError> {
        match self.handle.next_packet() {
            Ok(packet) => Ok(Some(packet.data)),
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(error) => Err(CoreError::Capture(error)),
        }
    }
}

// ── Test frame builders ─────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_frames {
    use super::tzsp::TZSP_PORT;

    /// Source MAC of the sample inner frame.
    pub(crate) const INNER_SRC_MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0x01];

    /// Ethernet II / IPv4 / UDP inner frame: sport 53, dport 40000,
    /// 100-byte payload.
    pub(crate) fn sample_inner_frame() -> Vec<u8> {
        let payload = [0u8; 100];
        let mut frame = Vec::new();
        // Ethernet II
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x01]); // dst
        frame.extend_from_slice(&INNER_SRC_MAC); // src
        frame.extend_from_slice(&0x0800u16.to_be_bytes());
        // IPv4, no options
        frame.extend_from_slice(&ipv4_header(17, 8 + payload.len() as u16));
        // UDP
        frame.extend_from_slice(&udp_header(53, 40_000, payload.len() as u16));
        frame.extend_from_slice(&payload);
        frame
    }

    /// Outer Ethernet/IPv4/UDP frame wrapping `tags` + `inner` as TZSP.
    pub(crate) fn outer_ipv4_frame(tags: &[u8], inner: &[u8]) -> Vec<u8> {
        let tzsp = tzsp_payload(tags, inner);
        let mut frame = Vec::new();
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]); // dst
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x03]); // src
        frame.extend_from_slice(&0x0800u16.to_be_bytes());
        frame.extend_from_slice(&ipv4_header(17, 8 + tzsp.len() as u16));
        frame.extend_from_slice(&udp_header(49_152, TZSP_PORT, tzsp.len() as u16));
        frame.extend_from_slice(&tzsp);
        frame
    }

    /// Outer Ethernet/IPv6/UDP frame wrapping `tags` + `inner` as TZSP.
    pub(crate) fn outer_ipv6_frame(tags: &[u8], inner: &[u8]) -> Vec<u8> {
        let tzsp = tzsp_payload(tags, inner);
        let mut frame = Vec::new();
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x02]); // dst
        frame.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x00, 0x03]); // src
        frame.extend_from_slice(&0x86DDu16.to_be_bytes());
        // IPv6 fixed header
        frame.extend_from_slice(&[0x60, 0, 0, 0]);
        frame.extend_from_slice(&((8 + tzsp.len()) as u16).to_be_bytes());
        frame.push(17); // next header: UDP
        frame.push(64); // hop limit
        frame.extend_from_slice(&[0u8; 16]); // src addr
        frame.extend_from_slice(&[0u8; 16]); // dst addr
        frame.extend_from_slice(&udp_header(49_152, TZSP_PORT, tzsp.len() as u16));
        frame.extend_from_slice(&tzsp);
        frame
    }

    fn tzsp_payload(tags: &[u8], inner: &[u8]) -> Vec<u8> {
        // version 1, type 0 (received), encapsulated protocol 1 (Ethernet)
        let mut payload = vec![0x01, 0x00, 0x00, 0x01];
        payload.extend_from_slice(tags);
        payload.extend_from_slice(inner);
        payload
    }

    fn ipv4_header(protocol: u8, payload_len: u16) -> [u8; 20] {
        let total_len = 20 + payload_len;
        let mut header = [0u8; 20];
        header[0] = 0x45; // version 4, IHL 5
        header[2..4].copy_from_slice(&total_len.to_be_bytes());
        header[8] = 64; // TTL
        header[9] = protocol;
        header[12..16].copy_from_slice(&[10, 0, 0, 1]);
        header[16..20].copy_from_slice(&[10, 0, 0, 2]);
        header
    }

    fn udp_header(src_port: u16, dst_port: u16, payload_len: u16) -> [u8; 8] {
        let mut header = [0u8; 8];
        header[0..2].copy_from_slice(&src_port.to_be_bytes());
        header[2..4].copy_from_slice(&dst_port.to_be_bytes());
        header[4..6].copy_from_slice(&(8 + payload_len).to_be_bytes());
        header
    }
}
