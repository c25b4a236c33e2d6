//! Interrupt-safe sharing of a control endpoint

use crate::{
    descriptors::{LandingPage, NoLandingPage},
    driver::ControlEndpoint,
    fifo::Fifo,
};
use core::cell::RefCell;
use critical_section::Mutex;

/// A control endpoint that may live in a `static`
///
/// Every call runs inside a critical section, so the interrupt handler and
/// the rest of your program never touch the endpoint at the same time. Until
/// you [`install()`](SharedEndpoint::install) an endpoint, calls do nothing.
pub struct SharedEndpoint<F, L = NoLandingPage> {
    ep0: Mutex<RefCell<Option<ControlEndpoint<F, L>>>>,
}

impl<F, L> SharedEndpoint<F, L> {
    /// Create an empty `SharedEndpoint`
    pub const fn new() -> Self {
        SharedEndpoint {
            ep0: Mutex::new(RefCell::new(None)),
        }
    }
}

impl<F: Fifo, L: LandingPage> SharedEndpoint<F, L> {
    /// Install the control endpoint, returning the one it replaces
    pub fn install(&self, ep0: ControlEndpoint<F, L>) -> Option<ControlEndpoint<F, L>> {
        critical_section::with(|cs| self.ep0.borrow(cs).replace(Some(ep0)))
    }

    /// Remove the control endpoint
    pub fn take(&self) -> Option<ControlEndpoint<F, L>> {
        critical_section::with(|cs| self.ep0.borrow(cs).take())
    }

    /// Interrupt-safe, mutable access to the control endpoint
    ///
    /// Returns `None` if there's no endpoint installed.
    pub fn with_endpoint<R>(
        &self,
        func: impl FnOnce(&mut ControlEndpoint<F, L>) -> R,
    ) -> Option<R> {
        critical_section::with(|cs| {
            let mut ep0 = self.ep0.borrow(cs).borrow_mut();
            ep0.as_mut().map(func)
        })
    }

    /// See [`ControlEndpoint::on_interrupt`]
    pub fn on_interrupt(&self) {
        self.with_endpoint(|ep0| ep0.on_interrupt());
    }

    /// See [`ControlEndpoint::poll`]
    pub fn poll(&self) {
        self.with_endpoint(|ep0| ep0.poll());
    }

    /// See [`ControlEndpoint::init`]
    pub fn init(&self) {
        self.with_endpoint(|ep0| ep0.init());
    }

    /// See [`ControlEndpoint::connect`]
    pub fn connect(&self) {
        self.with_endpoint(|ep0| ep0.connect());
    }

    /// See [`ControlEndpoint::disconnect`]
    pub fn disconnect(&self) {
        self.with_endpoint(|ep0| ep0.disconnect());
    }

    /// See [`ControlEndpoint::idle`]
    pub fn idle(&self) {
        self.with_endpoint(|ep0| ep0.idle());
    }

    /// The device's configuration value, or `None` if there's no endpoint
    pub fn configuration(&self) -> Option<u8> {
        self.with_endpoint(|ep0| ep0.configuration())
    }
}

impl<F, L> Default for SharedEndpoint<F, L> {
    fn default() -> Self {
        Self::new()
    }
}
