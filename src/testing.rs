//! A software model of the EP0 FIFOs and a cooperative host

use crate::{
    fifo::{Events, Fifo, Handshake, Token},
    setup::SetupPacket,
};
use std::{collections::VecDeque, vec::Vec};
use usb_device::UsbDirection;

/// Models the controller, and a host on the other end of the cable
///
/// When `host_collects` is set, the host takes an IN packet as soon as the IN
/// handshake becomes ACK: the IN FIFO's contents land in `packets`, and the IN
/// packet event becomes pending. Like the hardware, a SETUP resets both
/// handshakes to NAK, and discards anything left in the IN FIFO.
pub struct MockFifo {
    pub out_fifo: VecDeque<u8>,
    pub in_fifo: Vec<u8>,
    pub out_handshake: Handshake,
    pub in_handshake: Handshake,
    pub out_pending: Events,
    pub in_pending: Events,
    pub out_enabled: Events,
    pub in_enabled: Events,
    pub last_token: Token,
    pub in_toggle: bool,
    pub pullup: bool,
    pub interrupt: bool,
    /// Every IN packet the host collected, in order
    pub packets: Vec<Vec<u8>>,
    pub host_collects: bool,
}

impl MockFifo {
    pub fn new() -> Self {
        MockFifo {
            out_fifo: VecDeque::new(),
            in_fifo: Vec::new(),
            out_handshake: Handshake::Nak,
            in_handshake: Handshake::Nak,
            out_pending: Events::empty(),
            in_pending: Events::empty(),
            out_enabled: Events::empty(),
            in_enabled: Events::empty(),
            last_token: Token::Out,
            in_toggle: false,
            pullup: false,
            interrupt: false,
            packets: Vec::new(),
            host_collects: true,
        }
    }

    /// The host sends a SETUP with these eight bytes
    pub fn host_setup(&mut self, bytes: [u8; 8]) {
        self.in_fifo.clear();
        self.host_out(Token::Setup, &bytes);
        self.out_handshake = Handshake::Nak;
        self.in_handshake = Handshake::Nak;
    }

    /// The host sends a SETUP request
    pub fn host_request(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
    ) {
        let mut bytes = [0; 8];
        bytes[0] = request_type;
        bytes[1] = request;
        bytes[2..4].copy_from_slice(&value.to_le_bytes());
        bytes[4..6].copy_from_slice(&index.to_le_bytes());
        bytes[6..8].copy_from_slice(&length.to_le_bytes());
        debug_assert!(SetupPacket::parse(&bytes).is_some());
        self.host_setup(bytes);
    }

    /// The host sends `payload` behind a token, followed by a two byte CRC
    pub fn host_out(&mut self, token: Token, payload: &[u8]) {
        self.out_fifo.extend(payload.iter().copied());
        self.out_fifo.extend([0xC5, 0x3C]);
        self.last_token = token;
        self.out_pending |= Events::PACKET;
    }

    /// The host issues an IN token; returns the packet it took, if any
    pub fn host_in(&mut self) -> Option<Vec<u8>> {
        if self.in_handshake != Handshake::Ack || !self.in_pending.is_empty() {
            return None;
        }
        let packet: Vec<u8> = self.in_fifo.drain(..).collect();
        self.packets.push(packet.clone());
        self.in_pending |= Events::PACKET;
        Some(packet)
    }

    /// All collected packets, concatenated
    pub fn received(&self) -> Vec<u8> {
        self.packets.concat()
    }

    /// Sizes of the collected packets
    pub fn packet_sizes(&self) -> Vec<usize> {
        self.packets.iter().map(Vec::len).collect()
    }
}

impl Fifo for MockFifo {
    fn pop_out(&mut self) -> Option<u8> {
        self.out_fifo.pop_front()
    }

    fn push_in(&mut self, byte: u8) {
        self.in_fifo.push(byte);
    }

    fn in_empty(&self) -> bool {
        self.in_fifo.is_empty()
    }

    fn handshake(&self, direction: UsbDirection) -> Handshake {
        match direction {
            UsbDirection::Out => self.out_handshake,
            UsbDirection::In => self.in_handshake,
        }
    }

    fn set_handshake(&mut self, direction: UsbDirection, handshake: Handshake) {
        match direction {
            UsbDirection::Out => self.out_handshake = handshake,
            UsbDirection::In => {
                self.in_handshake = handshake;
                if self.host_collects && handshake == Handshake::Ack {
                    self.host_in();
                }
            }
        }
    }

    fn pending(&self, direction: UsbDirection) -> Events {
        match direction {
            UsbDirection::Out => self.out_pending,
            UsbDirection::In => self.in_pending,
        }
    }

    fn clear_pending(&mut self, direction: UsbDirection, events: Events) {
        match direction {
            UsbDirection::Out => self.out_pending.remove(events),
            UsbDirection::In => self.in_pending.remove(events),
        }
    }

    fn enable_events(&mut self, direction: UsbDirection, events: Events) {
        match direction {
            UsbDirection::Out => self.out_enabled = events,
            UsbDirection::In => self.in_enabled = events,
        }
    }

    fn last_token(&self) -> Token {
        self.last_token
    }

    fn set_in_toggle(&mut self, data1: bool) {
        self.in_toggle = data1;
    }

    fn set_pullup(&mut self, asserted: bool) {
        self.pullup = asserted;
    }

    fn set_interrupt(&mut self, enabled: bool) {
        self.interrupt = enabled;
    }
}
