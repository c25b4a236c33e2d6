//! Register access for the FIFO-per-endpoint USB controller
//!
//! The controller exposes each CSR in the low bits of its own 32-bit word.
//! The block starts with the pull-up CSR, followed by the EP0 OUT CSRs, then
//! the EP0 IN CSRs. Field definitions follow the RAL conventions, so that the
//! `ral-registers` macros work on the block.

#![allow(non_snake_case, non_upper_case_globals, dead_code)]

use core::cell::UnsafeCell;

pub use ral_registers::{modify_reg, read_reg, write_reg};

/// A volatile register cell
///
/// Conforms to the RAL register API, and can live either in device memory or,
/// for testing, in RAM.
#[repr(transparent)]
pub struct Reg(UnsafeCell<u32>);

impl Reg {
    pub const fn new(val: u32) -> Self {
        Reg(UnsafeCell::new(val))
    }
    #[inline(always)]
    pub fn read(&self) -> u32 {
        // Safety: pointer from a live reference; volatile to reach the device.
        unsafe { self.0.get().read_volatile() }
    }
    #[inline(always)]
    pub fn write(&self, val: u32) {
        // Safety: see read().
        unsafe { self.0.get().write_volatile(val) }
    }
}

/// The USB CSR block
#[repr(C)]
pub struct RegisterBlock {
    pub PULLUP_OUT: Reg,

    pub EP0_OUT_EV_STATUS: Reg,
    pub EP0_OUT_EV_PENDING: Reg,
    pub EP0_OUT_EV_ENABLE: Reg,
    pub EP0_OUT_LAST_TOK: Reg,
    pub EP0_OUT_RESPOND: Reg,
    pub EP0_OUT_DTB: Reg,
    pub EP0_OUT_OBUF_HEAD: Reg,
    pub EP0_OUT_OBUF_EMPTY: Reg,

    pub EP0_IN_EV_STATUS: Reg,
    pub EP0_IN_EV_PENDING: Reg,
    pub EP0_IN_EV_ENABLE: Reg,
    pub EP0_IN_LAST_TOK: Reg,
    pub EP0_IN_RESPOND: Reg,
    pub EP0_IN_DTB: Reg,
    pub EP0_IN_IBUF_HEAD: Reg,
    pub EP0_IN_IBUF_EMPTY: Reg,
}

impl RegisterBlock {
    /// A block with every register zeroed
    #[cfg(test)]
    pub const fn new() -> Self {
        RegisterBlock {
            PULLUP_OUT: Reg::new(0),
            EP0_OUT_EV_STATUS: Reg::new(0),
            EP0_OUT_EV_PENDING: Reg::new(0),
            EP0_OUT_EV_ENABLE: Reg::new(0),
            EP0_OUT_LAST_TOK: Reg::new(0),
            EP0_OUT_RESPOND: Reg::new(0),
            EP0_OUT_DTB: Reg::new(0),
            EP0_OUT_OBUF_HEAD: Reg::new(0),
            EP0_OUT_OBUF_EMPTY: Reg::new(0),
            EP0_IN_EV_STATUS: Reg::new(0),
            EP0_IN_EV_PENDING: Reg::new(0),
            EP0_IN_EV_ENABLE: Reg::new(0),
            EP0_IN_LAST_TOK: Reg::new(0),
            EP0_IN_RESPOND: Reg::new(0),
            EP0_IN_DTB: Reg::new(0),
            EP0_IN_IBUF_HEAD: Reg::new(0),
            EP0_IN_IBUF_EMPTY: Reg::new(0),
        }
    }
}

macro_rules! field {
    ($name:ident, $offset:expr, $width_mask:expr) => {
        pub mod $name {
            pub const offset: u32 = $offset;
            pub const mask: u32 = $width_mask << offset;
            pub mod RW {}
            pub mod R {}
            pub mod W {}
        }
    };
}

macro_rules! events {
    ($reg:ident) => {
        pub mod $reg {
            field!(ERROR, 0, 0b1);
            field!(PACKET, 1, 0b1);
        }
    };
}

pub mod PULLUP_OUT {
    field!(PULLUP, 0, 0b1);
}

events!(EP0_OUT_EV_STATUS);
events!(EP0_OUT_EV_PENDING);
events!(EP0_OUT_EV_ENABLE);
events!(EP0_IN_EV_STATUS);
events!(EP0_IN_EV_PENDING);
events!(EP0_IN_EV_ENABLE);

pub mod EP0_OUT_LAST_TOK {
    field!(PID, 0, 0b11);
}

pub mod EP0_IN_LAST_TOK {
    field!(PID, 0, 0b11);
}

pub mod EP0_OUT_RESPOND {
    field!(RESPOND, 0, 0b11);
}

pub mod EP0_IN_RESPOND {
    field!(RESPOND, 0, 0b11);
}

pub mod EP0_OUT_DTB {
    field!(DTB, 0, 0b1);
}

pub mod EP0_IN_DTB {
    field!(DTB, 0, 0b1);
}

pub mod EP0_OUT_OBUF_HEAD {
    field!(DATA, 0, 0xFF);
}

pub mod EP0_OUT_OBUF_EMPTY {
    field!(EMPTY, 0, 0b1);
}

pub mod EP0_IN_IBUF_HEAD {
    field!(DATA, 0, 0xFF);
}

pub mod EP0_IN_IBUF_EMPTY {
    field!(EMPTY, 0, 0b1);
}

const _: [(); 1] = [(); (core::mem::size_of::<RegisterBlock>() == 17 * 4) as usize];
