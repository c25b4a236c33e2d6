//! Memory-mapped implementation of the FIFO interface

use crate::{
    fifo::{Events, Fifo, Handshake, Token},
    ral, Peripherals,
};
use usb_device::UsbDirection;

/// The controller's CSR block, accessed through [`Peripherals`]
///
/// `Csr` is the [`Fifo`] you'll want on real hardware.
pub struct Csr<P> {
    peripherals: P,
    regs: &'static ral::RegisterBlock,
}

// Safety: Csr is the sole owner of the register block, through P.
unsafe impl<P: Send> Send for Csr<P> {}

impl<P: Peripherals> Csr<P> {
    /// Take ownership of the USB peripherals
    pub fn new(peripherals: P) -> Self {
        // Safety: Peripherals implementers guarantee a valid, owned CSR block
        // that lives for the rest of the program.
        let regs = unsafe { &*(peripherals.csr() as *const ral::RegisterBlock) };
        Csr { peripherals, regs }
    }

    /// Release the peripherals
    pub fn release(self) -> P {
        self.peripherals
    }
}

impl<P: Peripherals> Fifo for Csr<P> {
    fn pop_out(&mut self) -> Option<u8> {
        if ral::read_reg!(ral, self.regs, EP0_OUT_OBUF_EMPTY, EMPTY == 1) {
            return None;
        }
        let byte = ral::read_reg!(ral, self.regs, EP0_OUT_OBUF_HEAD, DATA) as u8;
        // Any write advances the FIFO.
        ral::write_reg!(ral, self.regs, EP0_OUT_OBUF_HEAD, 0);
        Some(byte)
    }

    fn push_in(&mut self, byte: u8) {
        ral::write_reg!(ral, self.regs, EP0_IN_IBUF_HEAD, DATA: byte as u32);
    }

    fn in_empty(&self) -> bool {
        ral::read_reg!(ral, self.regs, EP0_IN_IBUF_EMPTY, EMPTY == 1)
    }

    fn handshake(&self, direction: UsbDirection) -> Handshake {
        Handshake::from_bits(match direction {
            UsbDirection::Out => ral::read_reg!(ral, self.regs, EP0_OUT_RESPOND, RESPOND),
            UsbDirection::In => ral::read_reg!(ral, self.regs, EP0_IN_RESPOND, RESPOND),
        })
    }

    fn set_handshake(&mut self, direction: UsbDirection, handshake: Handshake) {
        let respond = handshake as u32;
        match direction {
            UsbDirection::Out => ral::write_reg!(ral, self.regs, EP0_OUT_RESPOND, RESPOND: respond),
            UsbDirection::In => ral::write_reg!(ral, self.regs, EP0_IN_RESPOND, RESPOND: respond),
        }
    }

    fn pending(&self, direction: UsbDirection) -> Events {
        Events::from_bits_truncate(match direction {
            UsbDirection::Out => ral::read_reg!(ral, self.regs, EP0_OUT_EV_PENDING),
            UsbDirection::In => ral::read_reg!(ral, self.regs, EP0_IN_EV_PENDING),
        })
    }

    fn clear_pending(&mut self, direction: UsbDirection, events: Events) {
        match direction {
            UsbDirection::Out => ral::write_reg!(ral, self.regs, EP0_OUT_EV_PENDING, events.bits()),
            UsbDirection::In => ral::write_reg!(ral, self.regs, EP0_IN_EV_PENDING, events.bits()),
        }
    }

    fn enable_events(&mut self, direction: UsbDirection, events: Events) {
        match direction {
            UsbDirection::Out => ral::write_reg!(ral, self.regs, EP0_OUT_EV_ENABLE, events.bits()),
            UsbDirection::In => ral::write_reg!(ral, self.regs, EP0_IN_EV_ENABLE, events.bits()),
        }
    }

    fn last_token(&self) -> Token {
        Token::from_bits(ral::read_reg!(ral, self.regs, EP0_OUT_LAST_TOK, PID))
    }

    fn set_in_toggle(&mut self, data1: bool) {
        ral::write_reg!(ral, self.regs, EP0_IN_DTB, DTB: data1 as u32);
    }

    fn set_pullup(&mut self, asserted: bool) {
        ral::write_reg!(ral, self.regs, PULLUP_OUT, PULLUP: asserted as u32);
    }

    fn set_interrupt(&mut self, enabled: bool) {
        self.peripherals.set_interrupt(enabled);
    }
}
