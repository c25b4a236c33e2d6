//! The control endpoint engine
//!
//! `ControlEndpoint` receives packets from the OUT FIFO, dispatches SETUP
//! requests, and carries out the answer: a data stage through the chunker, a
//! status acknowledgement, or a stall.

use crate::{
    config::Config,
    control::{Device, Reply},
    descriptors::{DescriptorTable, LandingPage, NoLandingPage},
    fifo::{Events, Fifo, Handshake, Token},
    handshake,
    setup::SetupPacket,
    transmit::Chunker,
};
use usb_device::{Result, UsbDirection};

/// Capacity of the OUT staging buffer
const STAGING_CAPACITY: usize = 128;
/// Every OUT and SETUP payload ends with a CRC16
const CRC_LEN: usize = 2;

/// Endpoint 0 of a USB device
///
/// After you create a `ControlEndpoint`, you should
///
/// - call [`init()`](ControlEndpoint::init) early, so that the host doesn't
///   see the device before it's ready
/// - call [`connect()`](ControlEndpoint::connect) to attach to the bus
/// - call [`on_interrupt()`](ControlEndpoint::on_interrupt) from the USB
///   interrupt handler
///
/// Nothing here may be re-entered. If the endpoint is shared between the
/// interrupt handler and other code, wrap it in a
/// [`SharedEndpoint`](crate::SharedEndpoint).
pub struct ControlEndpoint<F, L = NoLandingPage> {
    fifo: F,
    device: Device<L>,
    chunker: Chunker,
    staging: [u8; STAGING_CAPACITY],
    config: Config,
}

impl<F: Fifo> ControlEndpoint<F> {
    /// Create a control endpoint that serves `descriptors`, without a WebUSB
    /// landing page
    pub fn new(fifo: F, descriptors: &'static DescriptorTable, config: Config) -> Self {
        Self::with_landing_page(fifo, descriptors, NoLandingPage, config)
    }
}

impl<F: Fifo, L: LandingPage> ControlEndpoint<F, L> {
    /// Create a control endpoint that also answers WebUSB GET_URL queries
    /// with `landing`
    pub fn with_landing_page(
        fifo: F,
        descriptors: &'static DescriptorTable,
        landing: L,
        config: Config,
    ) -> Self {
        ControlEndpoint {
            fifo,
            device: Device::new(descriptors, landing),
            chunker: Chunker::new(),
            staging: [0; STAGING_CAPACITY],
            config,
        }
    }

    /// Hide the device from the host
    ///
    /// Call this once, as early as possible after reset.
    pub fn init(&mut self) {
        self.fifo.set_pullup(false);
    }

    /// Attach to the bus, and start answering the host
    pub fn connect(&mut self) {
        // Stale events must be gone before events are enabled.
        self.fifo.clear_pending(UsbDirection::Out, Events::all());
        self.fifo.clear_pending(UsbDirection::In, Events::all());
        self.fifo.enable_events(UsbDirection::Out, Events::all());
        self.fifo.enable_events(UsbDirection::In, Events::all());

        self.fifo.set_handshake(UsbDirection::Out, Handshake::Ack);
        self.fifo.set_handshake(UsbDirection::In, Handshake::Nak);

        self.fifo.set_pullup(true);
        self.fifo.set_interrupt(true);
        debug!("CONNECT");
    }

    /// Stop answering the host, and detach from the bus
    ///
    /// Any reply that's being sent is abandoned.
    pub fn disconnect(&mut self) {
        self.idle();
        self.chunker.cancel();
        debug!("DISCONNECT");
    }

    /// Stop answering the host
    ///
    /// Both directions NAK, events and the interrupt are disabled, and the
    /// pull-up is released.
    pub fn idle(&mut self) {
        self.fifo.enable_events(UsbDirection::Out, Events::empty());
        self.fifo.enable_events(UsbDirection::In, Events::empty());
        self.fifo.set_handshake(UsbDirection::Out, Handshake::Nak);
        self.fifo.set_handshake(UsbDirection::In, Handshake::Nak);
        self.fifo.set_interrupt(false);
        self.fifo.set_pullup(false);
    }

    /// The device's configuration value; zero until the host configures it
    pub fn configuration(&self) -> u8 {
        self.device.configuration()
    }

    /// Indicates if a data stage is still being sent
    pub fn is_sending(&self) -> bool {
        self.chunker.is_active()
    }

    /// Service endpoint 0
    ///
    /// Call this from the USB interrupt handler. Receives any OUT or SETUP
    /// packet, and answers a SETUP before returning. Claims a completed IN
    /// packet, then queues the next packet of the current data stage, if any.
    pub fn on_interrupt(&mut self) {
        let pending = self.fifo.pending(UsbDirection::Out);
        if !pending.is_empty() {
            if pending.contains(Events::ERROR) {
                warn!("EP0 OUT ERROR");
            }
            let token = self.fifo.last_token();
            let received = self.receive();
            if token == Token::Setup {
                self.fifo.set_in_toggle(true);
                self.chunker.cancel();
                // A completion from before this SETUP must not override its answer.
                handshake::retire_in(&mut self.fifo);
                self.setup(received);
            } else {
                trace!("EP0 OUT {=?}", received);
            }
            self.fifo.clear_pending(UsbDirection::Out, pending);
            // Always accept the next OUT or SETUP.
            self.fifo.set_handshake(UsbDirection::Out, Handshake::Ack);
        }

        handshake::retire_in(&mut self.fifo);
        self.chunker.advance(&mut self.fifo);
    }

    #[cfg(test)]
    pub(crate) fn fifo_mut(&mut self) -> &mut F {
        &mut self.fifo
    }

    /// Queue the next packet of the current data stage, if the IN FIFO is free
    ///
    /// [`on_interrupt()`](Self::on_interrupt) already does this; `poll` is for
    /// callers that want to push a data stage along outside of the interrupt.
    pub fn poll(&mut self) {
        self.chunker.advance(&mut self.fifo);
    }

    /// Drain the OUT FIFO into the staging buffer
    ///
    /// Returns the payload length, without the CRC, or `None` if the packet
    /// didn't fit.
    fn receive(&mut self) -> Option<usize> {
        let mut len = 0;
        let mut overflow = false;
        while let Some(byte) = self.fifo.pop_out() {
            match self.staging.get_mut(len) {
                Some(slot) => {
                    *slot = byte;
                    len += 1;
                }
                None => overflow = true,
            }
        }
        if overflow {
            warn!("EP0 OUT OVERFLOW");
            return None;
        }
        Some(len.saturating_sub(CRC_LEN))
    }

    /// Answer the SETUP packet in the staging buffer
    fn setup(&mut self, received: Option<usize>) {
        let Some(packet) = received.and_then(|len| SetupPacket::parse(&self.staging[..len])) else {
            warn!("EP0 SETUP MALFORMED");
            handshake::stall(&mut self.fifo);
            return;
        };
        trace!(
            "EP0 SETUP {=u8:#x} {=u8:#x} {=u16:#x} {=u16:#x} {=u16}",
            packet.request_type,
            packet.request,
            packet.value,
            packet.index,
            packet.length
        );

        let request = packet.classify(&self.config.vendor);
        let result = match self.device.respond(&request) {
            Ok(Reply::Data(payload)) => {
                let payload = payload.clamp(packet.length as usize);
                if payload.is_empty() {
                    self.acknowledge()
                } else {
                    self.chunker
                        .begin_within(&mut self.fifo, payload, self.config.wait)
                }
            }
            Ok(Reply::Status) => self.acknowledge(),
            Err(_reject) => {
                warn!(
                    "EP0 STALL {=u8:#x} {=u8:#x} ({=u8})",
                    packet.request_type,
                    packet.request,
                    _reject as u8
                );
                handshake::stall(&mut self.fifo);
                return;
            }
        };

        if result.is_err() {
            warn!("EP0 HOST TIMEOUT {=u8:#x}", packet.request);
            handshake::stall(&mut self.fifo);
        }
    }

    fn acknowledge(&mut self) -> Result<()> {
        handshake::acknowledge_status_within(&mut self.fifo, self.config.wait)
    }
}
