//! Control endpoint configuration

use usb_device::{Result, UsbError};

/// How long a blocking call may wait for the host
///
/// The control endpoint has two waiting points: starting a transfer while a
/// previous one is still draining, and acknowledging a status stage while a
/// previous acknowledgement is still queued. Both depend on the host issuing
/// IN tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Wait {
    /// Spin until the host responds, however long that takes
    ///
    /// A host that stops responding blocks the caller indefinitely.
    #[default]
    Forever,
    /// Give up after polling the hardware this many times
    Spins(u32),
}

impl Wait {
    pub(crate) fn budget(self) -> Budget {
        Budget(match self {
            Wait::Forever => None,
            Wait::Spins(spins) => Some(spins),
        })
    }
}

/// Remaining polls for one wait
pub(crate) struct Budget(Option<u32>);

impl Budget {
    /// Spend one poll
    ///
    /// Returns `WouldBlock` once the budget is exhausted.
    pub(crate) fn spend(&mut self) -> Result<()> {
        match &mut self.0 {
            None => Ok(()),
            Some(0) => Err(UsbError::WouldBlock),
            Some(spins) => {
                *spins -= 1;
                Ok(())
            }
        }
    }
}

/// Vendor request codes advertised by the device's descriptors
///
/// These must agree with the descriptors you serve. The Microsoft code is
/// embedded in the Microsoft OS string descriptor (string index `0xEE`); the
/// WebUSB code is embedded in the BOS platform capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VendorCodes {
    /// Request code for the Microsoft compatible-ID query
    pub microsoft: u8,
    /// Request code for WebUSB queries
    pub webusb: u8,
}

impl Default for VendorCodes {
    fn default() -> Self {
        VendorCodes {
            // Arbitrary, but printable ASCII.
            microsoft: b'~',
            webusb: 2,
        }
    }
}

/// Control endpoint settings
///
/// ```
/// use epfifo_ep0::{Config, Wait};
///
/// let config = Config {
///     wait: Wait::Spins(100_000),
///     ..Config::default()
/// };
/// assert_eq!(config.vendor.microsoft, b'~');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Config {
    /// Vendor request codes for the Microsoft and WebUSB queries
    pub vendor: VendorCodes,
    /// Policy for the blocking points inside request handling
    pub wait: Wait,
}

#[cfg(test)]
mod tests {
    use super::Wait;
    use usb_device::UsbError;

    #[test]
    fn forever_never_expires() {
        let mut budget = Wait::Forever.budget();
        for _ in 0..10_000 {
            budget.spend().unwrap();
        }
    }

    #[test]
    fn spins_expire() {
        let mut budget = Wait::Spins(3).budget();
        for _ in 0..3 {
            budget.spend().unwrap();
        }
        assert_eq!(budget.spend(), Err(UsbError::WouldBlock));
        assert_eq!(budget.spend(), Err(UsbError::WouldBlock));
    }

    #[test]
    fn zero_spins() {
        assert_eq!(Wait::Spins(0).budget().spend(), Err(UsbError::WouldBlock));
    }
}
