// ── TZSP de-encapsulation ──
//
// Outer frames are Ethernet/IP/UDP with a TZSP payload on port 37008.
// The header is four fixed bytes (version, type, encapsulated protocol)
// followed by tagged fields: 0x00 is a single-byte pad, 0x01 ends the
// tags, anything else carries a one-byte length plus value. The mirrored
// frame starts right after the end tag.

use etherparse::{SlicedPacket, TransportSlice};

/// UDP port TZSP mirrors arrive on.
pub const TZSP_PORT: u16 = 37008;

const TAG_PAD: u8 = 0x00;
const TAG_END: u8 = 0x01;
const FIXED_HEADER_LEN: usize = 4;

/// Unwrap the mirrored inner frame from an outer TZSP-over-UDP frame.
///
/// Returns `None` for anything that is not well-formed TZSP on the
/// expected port; such frames are dropped (and counted) by the caller.
pub fn extract_inner(frame: &[u8]) -> Option<&[u8]> {
    let sliced = SlicedPacket::from_ethernet(frame).ok()?;
    let TransportSlice::Udp(udp) = sliced.transport? else {
        return None;
    };
    if udp.source_port() != TZSP_PORT && udp.destination_port() != TZSP_PORT {
        return None;
    }
    strip_tzsp_header(udp.payload())
}

/// Walk the tagged fields and return the payload after the end tag.
fn strip_tzsp_header(payload: &[u8]) -> Option<&[u8]> {
    let mut index = FIXED_HEADER_LEN;
    loop {
        match *payload.get(index)? {
            TAG_PAD => index += 1,
            TAG_END => return payload.get(index + 1..),
            _tagged => {
                let value_len = *payload.get(index + 1)? as usize;
                index += 2 + value_len;
            }
        }
    }
}
