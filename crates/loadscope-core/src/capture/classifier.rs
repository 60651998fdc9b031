// ── Inner-frame classifier ──
//
// Walks the mirrored frame's headers by offset and produces the
// classification key the store matches against. Fields that cannot be
// read (unknown EtherType, short transport header) stay zero, which the
// match rule treats as "unset", not as an error.

use tracing::trace;

use crate::model::{Direction, FlowKey, MacAddress};

const ETHERNET_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const IPV6_HEADER_LEN: usize = 40;
const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;
const UDP_HEADER_LEN: usize = 8;
const TCP_HEADER_LEN: usize = 20;

/// Stateless classifier bound to the monitored device's MAC.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    monitored_mac: MacAddress,
}

impl Classifier {
    pub fn new(monitored_mac: MacAddress) -> Self {
        Self { monitored_mac }
    }

    /// Classify one inner frame into a key plus its byte length.
    ///
    /// Returns `None` only when the frame is too short for an Ethernet II
    /// header; the caller counts that as a decode drop.
    pub fn classify(&self, inner: &[u8]) -> Option<(FlowKey, u64)> {
        if inner.len() < ETHERNET_HEADER_LEN {
            return None;
        }

        let direction = if inner[6..12] == self.monitored_mac.as_bytes()[..] {
            Direction::Tx
        } else {
            Direction::Rx
        };
        let network_protocol = u16::from_be_bytes([inner[12], inner[13]]);

        let mut transport_protocol = 0u8;
        let mut src_port = 0u16;
        let mut dst_port = 0u16;

        let l3 = &inner[ETHERNET_HEADER_LEN..];
        let transport_offset = match network_protocol {
            ETHERTYPE_IPV4 if l3.len() >= 20 => {
                let header_len = ((l3[0] & 0x0f) as usize) * 4;
                transport_protocol = l3[9];
                (l3.len() >= header_len).then_some(header_len)
            }
            ETHERTYPE_IPV6 if l3.len() >= IPV6_HEADER_LEN => {
                transport_protocol = l3[6];
                Some(IPV6_HEADER_LEN)
            }
            _ => None,
        };

        if let Some(offset) = transport_offset {
            let l4 = &l3[offset..];
            let header_present = match transport_protocol {
                IPPROTO_UDP => l4.len() >= UDP_HEADER_LEN,
                IPPROTO_TCP => l4.len() >= TCP_HEADER_LEN,
                _ => false,
            };
            if header_present {
                src_port = u16::from_be_bytes([l4[0], l4[1]]);
                dst_port = u16::from_be_bytes([l4[2], l4[3]]);
            }
        }

        let key = FlowKey {
            network_protocol,
            transport_protocol,
            src_port,
            dst_port,
            direction,
        };
        trace!(?key, bytes = inner.len(), "frame classified");
        Some((key, inner.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::test_frames::{sample_inner_frame, INNER_SRC_MAC};

    fn other_mac() -> MacAddress {
        MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x09])
    }

    #[test]
    fn classifies_ipv4_udp_as_rx() {
        let inner = sample_inner_frame();
        let classifier = Classifier::new(other_mac());
        let (key, bytes) = classifier.classify(&inner).unwrap();

        assert_eq!(key.network_protocol, 0x0800);
        assert_eq!(key.transport_protocol, 17);
        assert_eq!(key.src_port, 53);
        assert_eq!(key.dst_port, 40_000);
        assert_eq!(key.direction, Direction::Rx);
        assert_eq!(bytes, inner.len() as u64);
    }

    #[test]
    fn monitored_source_mac_means_tx() {
        let inner = sample_inner_frame();
        let classifier = Classifier::new(MacAddress::new(INNER_SRC_MAC));
        let (key, _) = classifier.classify(&inner).unwrap();
        assert_eq!(key.direction, Direction::Tx);
    }

    #[test]
    fn unknown_ether_type_leaves_protocol_fields_zero() {
        let mut inner = sample_inner_frame();
        inner[12..14].copy_from_slice(&0x0806u16.to_be_bytes()); // ARP
        let (key, _) = Classifier::new(other_mac()).classify(&inner).unwrap();

        assert_eq!(key.network_protocol, 0x0806);
        assert_eq!(key.transport_protocol, 0);
        assert_eq!(key.src_port, 0);
        assert_eq!(key.dst_port, 0);
    }

    #[test]
    fn short_transport_header_leaves_ports_zero() {
        let inner = sample_inner_frame();
        // Keep Ethernet + IPv4 but cut into the UDP header.
        let truncated = &inner[..ETHERNET_HEADER_LEN + 20 + 4];
        let (key, bytes) = Classifier::new(other_mac()).classify(truncated).unwrap();

        assert_eq!(key.transport_protocol, 17);
        assert_eq!(key.src_port, 0);
        assert_eq!(key.dst_port, 0);
        assert_eq!(bytes, truncated.len() as u64);
    }

    #[test]
    fn runt_frame_is_rejected() {
        assert!(Classifier::new(other_mac()).classify(&[0u8; 10]).is_none());
    }
}
