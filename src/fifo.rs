//! The hardware interface consumed by the control endpoint

use usb_device::UsbDirection;

/// How an endpoint direction answers the next token
///
/// Values match the controller's two-bit `respond` encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Handshake {
    /// Accept, or offer, data now
    Ack = 0,
    /// Busy, or nothing to offer yet
    Nak = 1,
    /// Don't respond at all
    None = 2,
    /// Protocol error; cleared by the next SETUP
    Stall = 3,
}

impl Handshake {
    /// Decode the two-bit `respond` field; higher bits are ignored
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Handshake::Ack,
            1 => Handshake::Nak,
            2 => Handshake::None,
            _ => Handshake::Stall,
        }
    }
}

/// The type of the last token received on an endpoint
///
/// The controller only reports PID bits 2 and 3, since the rest are
/// redundant once the packet has been validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Token {
    Out = 0,
    Sof = 1,
    In = 2,
    Setup = 3,
}

impl Token {
    /// Decode the two-bit `last_tok` field; higher bits are ignored
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Token::Out,
            1 => Token::Sof,
            2 => Token::In,
            _ => Token::Setup,
        }
    }
}

bitflags::bitflags! {
    /// Per-direction event sources
    ///
    /// Used for the pending register (write one to clear) and for the
    /// enable mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Events : u32 {
        /// A transaction failed
        const ERROR = 1 << 0;
        /// A packet completed
        const PACKET = 1 << 1;
    }
}

/// Byte-level access to endpoint 0 of a FIFO-per-endpoint USB controller
///
/// The control endpoint engine never touches the hardware except through this
/// trait. [`Csr`](crate::Csr) implements it for the memory-mapped controller.
///
/// Implementations perform each call immediately. The engine assumes that
/// it's the only user of the interface, and that it's never re-entered.
pub trait Fifo {
    /// Pop the next byte from the OUT FIFO, or `None` if the FIFO is empty
    fn pop_out(&mut self) -> Option<u8>;
    /// Push a byte onto the IN FIFO
    fn push_in(&mut self, byte: u8);
    /// Indicates if the IN FIFO has no queued bytes
    fn in_empty(&self) -> bool;

    /// Returns the handshake for the next token in `direction`
    fn handshake(&self, direction: UsbDirection) -> Handshake;
    /// Set the handshake for the next token in `direction`
    fn set_handshake(&mut self, direction: UsbDirection, handshake: Handshake);

    /// Returns the pending events for `direction`
    fn pending(&self, direction: UsbDirection) -> Events;
    /// Clear the `events` pending for `direction`
    fn clear_pending(&mut self, direction: UsbDirection, events: Events);
    /// Select which `events` raise the interrupt for `direction`
    fn enable_events(&mut self, direction: UsbDirection, events: Events);

    /// Returns the type of the last token received on EP0 OUT
    fn last_token(&self) -> Token;
    /// Set the data toggle used for the next IN packet (`true` for DATA1)
    fn set_in_toggle(&mut self, data1: bool);
    /// Assert (`true`) or release (`false`) the D+ pull-up
    fn set_pullup(&mut self, asserted: bool);
    /// Unmask (`true`) or mask (`false`) the USB interrupt
    fn set_interrupt(&mut self, enabled: bool);
}
