//! A USB control endpoint (EP0) engine for FIFO-per-endpoint device controllers
//!
//! `epfifo-ep0` enumerates a full-speed USB device on controllers that expose
//! endpoint 0 as a pair of byte FIFOs, a handshake register per direction, and
//! packet / error events. It answers the standard requests a host issues
//! during enumeration, serves static descriptors (including the Microsoft
//! compatible-ID and WebUSB extensions), and sequences the ACK / NAK / STALL
//! handshakes that drive a control transfer.
//!
//! The crate is split along the same seams as the hardware:
//!
//! - [`Fifo`] is the hardware interface. [`Csr`] implements it for the
//!   memory-mapped CSR block; you may also implement it yourself.
//! - [`ControlEndpoint`] owns a `Fifo`, the descriptor table, and all transfer
//!   state. Call [`on_interrupt()`](ControlEndpoint::on_interrupt) from the
//!   USB interrupt handler.
//! - [`SharedEndpoint`] wraps a `ControlEndpoint` in a critical section, so
//!   that it can live in a `static` that's shared between the interrupt handler
//!   and the rest of your program.
//!
//! To access the memory-mapped controller, you must define a safe
//! implementation of [`Peripherals`]. See the peripherals documentation for
//! more information.
//!
//! # Example
//!
//! ```no_run
//! use epfifo_ep0::{descriptors, Config, ControlEndpoint, Csr, Peripherals, SharedEndpoint};
//!
//! struct Usb;
//!
//! unsafe impl Peripherals for Usb {
//!     fn csr(&self) -> *const () {
//!         0xe000_4800 as *const ()
//!     }
//!     fn set_interrupt(&self, _enabled: bool) {
//!         // Toggle the USB line in the CPU's interrupt mask...
//!     }
//! }
//!
//! static USB: SharedEndpoint<Csr<Usb>> = SharedEndpoint::new();
//!
//! let ep0 = ControlEndpoint::new(Csr::new(Usb), &descriptors::UPDATER, Config::default());
//! USB.install(ep0);
//! USB.connect();
//!
//! // From the USB interrupt handler:
//! USB.on_interrupt();
//! ```

#![no_std]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

mod bus;
mod config;
mod control;
mod csr;
pub mod descriptors;
mod driver;
mod fifo;
mod handshake;
mod ral;
pub mod setup;
mod transmit;

#[cfg(test)]
mod testing;

pub use bus::SharedEndpoint;
pub use config::{Config, VendorCodes, Wait};
pub use control::{Device, Reject, Reply};
pub use csr::Csr;
pub use driver::ControlEndpoint;
pub use fifo::{Events, Fifo, Handshake, Token};
pub use transmit::Payload;

/// Maximum packet size of the control endpoint, in bytes
pub const MAX_PACKET_SIZE: usize = 64;

/// A type that owns the USB controller's CSR block
///
/// An implementation of `Peripherals` is expected to own
///
/// - the EP0 FIFO / event / handshake CSRs, and the pull-up CSR
/// - the USB line in the CPU's interrupt mask
///
/// # Safety
///
/// `Peripherals` should only be implemented on a type that owns the USB
/// controller. The pointer returned by [`csr()`](Peripherals::csr) is
/// assumed to be valid for the lifetime of the program, and will be cast to
/// a register block definition.
///
/// # Example
///
/// ```
/// use epfifo_ep0::Peripherals;
///
/// struct Fomu {
///     _private: (),
/// }
///
/// unsafe impl Peripherals for Fomu {
///     fn csr(&self) -> *const () {
///         0xe000_4800 as *const ()
///     }
///     fn set_interrupt(&self, _enabled: bool) {}
/// }
///
/// let usb = Fomu { _private: () };
/// assert_eq!(usb.csr(), 0xe000_4800 as *const ());
/// ```
pub unsafe trait Peripherals {
    /// Returns the address of the USB CSR block
    fn csr(&self) -> *const ();
    /// Unmask (`true`) or mask (`false`) the USB interrupt in the CPU's
    /// global interrupt mask
    fn set_interrupt(&self, enabled: bool);
}
