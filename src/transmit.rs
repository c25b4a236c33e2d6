//! Transmit chunker
//!
//! Splits a reply into packets no larger than [`MAX_PACKET_SIZE`], and feeds
//! them to the IN FIFO one at a time. A data stage ends on a short packet. If
//! the last real packet is exactly the maximum size, an extra zero-length
//! packet ends the stage instead.

use crate::{config::Wait, fifo::Fifo, fifo::Handshake, handshake, MAX_PACKET_SIZE};
use usb_device::{Result, UsbDirection};

/// Size of the largest reply that's built at runtime
const INLINE_CAPACITY: usize = 2;

/// The bytes of a control reply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Payload {
    /// Borrowed, static bytes; typically a descriptor
    Static(&'static [u8]),
    /// A short reply built at runtime, like a status or configuration value
    Inline {
        bytes: [u8; INLINE_CAPACITY],
        len: u8,
    },
}

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Static(bytes) => bytes,
            Payload::Inline { bytes, len } => &bytes[..*len as usize],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Truncate the payload to at most `max` bytes
    pub fn clamp(self, max: usize) -> Self {
        match self {
            Payload::Static(bytes) => Payload::Static(&bytes[..bytes.len().min(max)]),
            Payload::Inline { bytes, len } => Payload::Inline {
                bytes,
                len: (len as usize).min(max) as u8,
            },
        }
    }
}

impl From<&'static [u8]> for Payload {
    fn from(bytes: &'static [u8]) -> Self {
        Payload::Static(bytes)
    }
}

impl From<[u8; 1]> for Payload {
    fn from([byte]: [u8; 1]) -> Self {
        Payload::Inline {
            bytes: [byte, 0],
            len: 1,
        }
    }
}

impl From<[u8; 2]> for Payload {
    fn from(bytes: [u8; 2]) -> Self {
        Payload::Inline { bytes, len: 2 }
    }
}

/// The reply that's being sent
struct Transfer {
    payload: Payload,
    /// Bytes already taken by the host
    offset: usize,
    /// Size of the packet sitting in the IN FIFO
    queued: usize,
    /// The last queued packet was full-size, so a zero-length packet follows
    zlp_owed: bool,
}

/// Sends one reply at a time
pub struct Chunker {
    transfer: Option<Transfer>,
}

impl Chunker {
    pub const fn new() -> Self {
        Chunker { transfer: None }
    }

    /// Indicates if a reply still has packets to send
    pub fn is_active(&self) -> bool {
        self.transfer.is_some()
    }

    /// Forget the current reply, if any
    ///
    /// Bytes that are already in the IN FIFO stay there.
    pub fn cancel(&mut self) {
        self.transfer = None;
    }

    /// Start sending `payload`
    ///
    /// If another reply is still being sent, `begin` blocks until the host has
    /// taken all of it. Then it queues the first packet of `payload`, if the
    /// IN FIFO is free.
    pub fn begin<F: Fifo>(&mut self, fifo: &mut F, payload: Payload) {
        // Forever never runs out.
        let _ = self.begin_within(fifo, payload, Wait::Forever);
    }

    /// Start sending `payload`, waiting at most `wait` for the previous reply
    ///
    /// Returns `WouldBlock` if the previous reply is still being sent when the
    /// wait expires. In that case, `payload` is dropped and the previous reply
    /// is still active.
    pub fn begin_within<F: Fifo>(
        &mut self,
        fifo: &mut F,
        payload: Payload,
        wait: Wait,
    ) -> Result<()> {
        let mut budget = wait.budget();
        while self.is_active() {
            budget.spend()?;
            handshake::retire_in(fifo);
            self.advance(fifo);
        }

        trace!("EP0 IN BEGIN {=usize}", payload.len());
        self.transfer = Some(Transfer {
            payload,
            offset: 0,
            queued: 0,
            zlp_owed: false,
        });
        self.advance(fifo);
        Ok(())
    }

    /// Queue the next packet of the current reply
    ///
    /// Does nothing unless the IN handshake is NAK and the IN FIFO is empty;
    /// that is, unless the host took the last packet, and its completion was
    /// retired.
    pub fn advance<F: Fifo>(&mut self, fifo: &mut F) {
        if fifo.handshake(UsbDirection::In) != Handshake::Nak || !fifo.in_empty() {
            return;
        }
        let Some(transfer) = self.transfer.as_mut() else {
            return;
        };

        transfer.offset += transfer.queued;
        transfer.queued = 0;
        let rest = transfer
            .payload
            .as_bytes()
            .get(transfer.offset..)
            .unwrap_or(&[]);

        if rest.len() > MAX_PACKET_SIZE {
            queue(fifo, &rest[..MAX_PACKET_SIZE]);
            transfer.queued = MAX_PACKET_SIZE;
            transfer.zlp_owed = false;
        } else if rest.len() == MAX_PACKET_SIZE {
            queue(fifo, rest);
            transfer.queued = MAX_PACKET_SIZE;
            transfer.zlp_owed = true;
        } else if transfer.zlp_owed {
            queue(fifo, &[]);
            self.transfer = None;
        } else if rest.is_empty() {
            self.transfer = None;
        } else {
            queue(fifo, rest);
            transfer.queued = rest.len();
        }
    }
}

/// Load one packet into the IN FIFO, and offer it to the host
fn queue<F: Fifo>(fifo: &mut F, packet: &[u8]) {
    for &byte in packet {
        fifo.push_in(byte);
    }
    trace!("EP0 IN {=usize}", packet.len());
    fifo.set_handshake(UsbDirection::In, Handshake::Ack);
}

#[cfg(test)]
mod tests {
    use super::{Chunker, Payload};
    use crate::{config::Wait, fifo::Fifo, fifo::Handshake, handshake, testing::MockFifo};
    use std::vec::Vec;
    use usb_device::{UsbDirection, UsbError};

    static BYTES: [u8; 200] = {
        let mut bytes = [0; 200];
        let mut i = 0;
        while i < bytes.len() {
            bytes[i] = i as u8;
            i += 1;
        }
        bytes
    };

    /// Let the host take packets until the reply is done
    fn drain(chunker: &mut Chunker, fifo: &mut MockFifo) {
        while chunker.is_active() {
            handshake::retire_in(fifo);
            chunker.advance(fifo);
        }
    }

    fn send(len: usize) -> MockFifo {
        let mut fifo = MockFifo::new();
        let mut chunker = Chunker::new();
        chunker.begin(&mut fifo, Payload::Static(&BYTES[..len]));
        drain(&mut chunker, &mut fifo);
        assert_eq!(fifo.received(), &BYTES[..len]);
        fifo
    }

    #[test]
    fn short_reply() {
        assert_eq!(send(18).packet_sizes(), [18]);
    }

    #[test]
    fn exact_packet_gets_zlp() {
        assert_eq!(send(64).packet_sizes(), [64, 0]);
    }

    #[test]
    fn long_reply_ends_short() {
        assert_eq!(send(130).packet_sizes(), [64, 64, 2]);
    }

    #[test]
    fn exact_multiple_gets_zlp() {
        assert_eq!(send(128).packet_sizes(), [64, 64, 0]);
    }

    #[test]
    fn empty_reply_sends_nothing() {
        assert!(send(0).packets.is_empty());
    }

    #[test]
    fn transfer_ends_after_short_packet_retires() {
        let mut fifo = MockFifo::new();
        let mut chunker = Chunker::new();
        chunker.begin(&mut fifo, Payload::Static(&BYTES[..5]));
        // Queued, and taken, but the completion isn't retired.
        assert!(chunker.is_active());
        chunker.advance(&mut fifo);
        assert!(chunker.is_active());

        handshake::retire_in(&mut fifo);
        chunker.advance(&mut fifo);
        assert!(!chunker.is_active());
        assert_eq!(fifo.packet_sizes(), [5]);
    }

    #[test]
    fn advance_waits_for_empty_fifo() {
        let mut fifo = MockFifo::new();
        fifo.push_in(0xAA);
        let mut chunker = Chunker::new();
        chunker.begin(&mut fifo, Payload::Static(&BYTES[..3]));
        assert_eq!(fifo.handshake(UsbDirection::In), Handshake::Nak);
        assert!(fifo.packets.is_empty());
    }

    #[test]
    fn back_to_back_replies_never_interleave() {
        let mut fifo = MockFifo::new();
        let mut chunker = Chunker::new();
        chunker.begin(&mut fifo, Payload::Static(&BYTES[..130]));
        assert!(chunker.is_active());
        chunker.begin(&mut fifo, Payload::Static(&BYTES[100..118]));
        drain(&mut chunker, &mut fifo);

        assert_eq!(fifo.packet_sizes(), [64, 64, 2, 18]);
        let mut expected = Vec::from(&BYTES[..130]);
        expected.extend_from_slice(&BYTES[100..118]);
        assert_eq!(fifo.received(), expected);
    }

    #[test]
    fn bounded_begin_expires() {
        let mut fifo = MockFifo::new();
        fifo.host_collects = false;
        let mut chunker = Chunker::new();
        chunker.begin(&mut fifo, Payload::Static(&BYTES[..18]));

        assert_eq!(
            chunker.begin_within(&mut fifo, Payload::from([1, 2]), Wait::Spins(32)),
            Err(UsbError::WouldBlock)
        );
        // The first reply is untouched.
        assert_eq!(fifo.in_fifo, &BYTES[..18]);
        assert!(chunker.is_active());

        // Once the host shows up, the next reply goes through.
        assert!(fifo.host_in().is_some());
        chunker
            .begin_within(&mut fifo, Payload::from([1, 2]), Wait::Spins(32))
            .unwrap();
        assert_eq!(fifo.in_fifo, [1, 2]);
    }

    #[test]
    fn cancel_forgets_reply() {
        let mut fifo = MockFifo::new();
        fifo.host_collects = false;
        let mut chunker = Chunker::new();
        chunker.begin(&mut fifo, Payload::Static(&BYTES[..100]));
        chunker.cancel();
        assert!(!chunker.is_active());
        // Doesn't block on the abandoned reply.
        chunker
            .begin_within(&mut fifo, Payload::from([7]), Wait::Spins(0))
            .unwrap();
    }

    #[test]
    fn payload_clamp() {
        assert_eq!(Payload::Static(&BYTES[..18]).clamp(8).len(), 8);
        assert_eq!(Payload::Static(&BYTES[..18]).clamp(255).len(), 18);
        assert_eq!(Payload::from([1, 2]).clamp(1).as_bytes(), [1]);
        assert_eq!(Payload::from([1, 2]).clamp(0).as_bytes(), [0u8; 0]);
        assert!(Payload::from([3]).clamp(9).as_bytes() == [3]);
    }
}
