//! Handshake primitives
//!
//! These drive the EP0 handshake registers directly. The waits poll IN
//! completion themselves, so they make progress without another execution
//! context servicing the interrupt.

use crate::{
    config::Wait,
    fifo::{Events, Fifo, Handshake},
};
use usb_device::{Result, UsbDirection};

/// Claim a completed IN packet
///
/// If the host took the queued IN packet, return the IN direction to NAK and
/// clear its pending events. This doesn't queue anything new.
///
/// Returns `true` if there was a completion to claim.
pub fn retire_in<F: Fifo>(fifo: &mut F) -> bool {
    let pending = fifo.pending(UsbDirection::In);
    if pending.is_empty() {
        return false;
    }
    if pending.contains(Events::ERROR) {
        warn!("EP0 IN ERROR");
    }
    fifo.set_handshake(UsbDirection::In, Handshake::Nak);
    fifo.clear_pending(UsbDirection::In, pending);
    true
}

/// Acknowledge a request that has no data stage
///
/// Waits until any earlier IN acknowledgement was taken by the host, then
/// queues an empty status packet. Blocks forever if the host never collects
/// the earlier packet; see [`acknowledge_status_within`] for a bounded wait.
pub fn acknowledge_status<F: Fifo>(fifo: &mut F) {
    // Forever never runs out.
    let _ = acknowledge_status_within(fifo, Wait::Forever);
}

/// Acknowledge a request that has no data stage, waiting at most `wait`
///
/// Returns `WouldBlock`, and leaves the handshakes untouched, if the earlier
/// acknowledgement is still queued when the wait expires.
pub fn acknowledge_status_within<F: Fifo>(fifo: &mut F, wait: Wait) -> Result<()> {
    let mut budget = wait.budget();
    while fifo.handshake(UsbDirection::In) == Handshake::Ack {
        budget.spend()?;
        retire_in(fifo);
    }
    fifo.set_handshake(UsbDirection::In, Handshake::Ack);
    Ok(())
}

/// Stall both directions of EP0
///
/// The stall holds until the host sends the next SETUP.
pub fn stall<F: Fifo>(fifo: &mut F) {
    fifo.set_handshake(UsbDirection::Out, Handshake::Stall);
    fifo.set_handshake(UsbDirection::In, Handshake::Stall);
}
