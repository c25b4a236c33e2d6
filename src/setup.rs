//! SETUP packet decoding and request classification
//!
//! A SETUP packet is classified by its (direction, type, recipient, request)
//! tuple into a [`Request`]. Anything the control endpoint doesn't support
//! becomes [`Request::Unsupported`].

use crate::{config::VendorCodes, descriptors::DescriptorKey};
use usb_device::{
    control::{Recipient, Request as Std, RequestType},
    UsbDirection,
};

/// The eight bytes of a SETUP packet's DATA0 payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetupPacket {
    /// `bmRequestType`: direction, type, and recipient
    pub request_type: u8,
    /// `bRequest`
    pub request: u8,
    /// `wValue`; request specific
    pub value: u16,
    /// `wIndex`; request specific, often an interface or endpoint
    pub index: u16,
    /// Number of bytes in the data stage; for IN requests, the most the host
    /// will accept
    pub length: u16,
}

impl SetupPacket {
    /// Size of a SETUP payload, without CRC
    pub const LEN: usize = 8;

    /// Decode a SETUP payload
    ///
    /// Returns `None` unless `bytes` is exactly [`LEN`](Self::LEN) bytes long.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; Self::LEN] = bytes.try_into().ok()?;
        Some(SetupPacket {
            request_type: bytes[0],
            request: bytes[1],
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
            index: u16::from_le_bytes([bytes[4], bytes[5]]),
            length: u16::from_le_bytes([bytes[6], bytes[7]]),
        })
    }

    pub fn direction(&self) -> UsbDirection {
        if self.request_type & 0x80 != 0 {
            UsbDirection::In
        } else {
            UsbDirection::Out
        }
    }

    pub fn request_type(&self) -> RequestType {
        match (self.request_type >> 5) & 0b11 {
            0 => RequestType::Standard,
            1 => RequestType::Class,
            2 => RequestType::Vendor,
            _ => RequestType::Reserved,
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self.request_type & 0b1_1111 {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        }
    }

    /// Classify this packet into a request the control endpoint understands
    pub fn classify(&self, vendor: &VendorCodes) -> Request {
        use Recipient::{Device, Endpoint, Interface};
        use RequestType::{Standard, Vendor};
        use UsbDirection::{In, Out};

        match (
            self.direction(),
            self.request_type(),
            self.recipient(),
            self.request,
        ) {
            (Out, Standard, Device, Std::SET_ADDRESS) => Request::SetAddress,
            (Out, Standard, Interface, Std::SET_INTERFACE) => Request::SetInterface,
            (Out, Standard, Device, Std::SET_CONFIGURATION) => Request::SetConfiguration {
                value: self.value as u8,
            },
            (In, Standard, Device, Std::GET_CONFIGURATION) => Request::GetConfiguration,
            (In, Standard, Device, Std::GET_STATUS) => Request::GetDeviceStatus,
            (In, Standard, Endpoint, Std::GET_STATUS) => Request::GetEndpointStatus {
                endpoint: self.index,
            },
            (Out, Standard, Endpoint, Std::CLEAR_FEATURE) => Request::ClearEndpointFeature {
                endpoint: self.index,
                feature: self.value,
            },
            (Out, Standard, Endpoint, Std::SET_FEATURE) => Request::SetEndpointFeature {
                endpoint: self.index,
                feature: self.value,
            },
            (In, Standard, Device | Interface, Std::GET_DESCRIPTOR) => Request::GetDescriptor {
                key: DescriptorKey::from_value(self.value),
            },
            (In, Vendor, Device | Interface, code) if code == vendor.microsoft => {
                Request::MicrosoftDescriptor { index: self.index }
            }
            (In, Vendor, Device, code) if code == vendor.webusb => Request::WebUsb {
                index: self.index,
                value: self.value,
            },
            _ => Request::Unsupported,
        }
    }
}

/// A control request, classified
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request {
    /// The controller latches the address in hardware
    SetAddress,
    SetInterface,
    SetConfiguration {
        value: u8,
    },
    GetConfiguration,
    GetDeviceStatus,
    GetEndpointStatus {
        endpoint: u16,
    },
    ClearEndpointFeature {
        endpoint: u16,
        feature: u16,
    },
    SetEndpointFeature {
        endpoint: u16,
        feature: u16,
    },
    GetDescriptor {
        key: DescriptorKey,
    },
    /// Microsoft OS 1.0 vendor query; `index` 4 selects the compatible-ID
    /// descriptor
    MicrosoftDescriptor {
        index: u16,
    },
    /// WebUSB vendor query; `index` 2 is GET_URL, and `value` is the URL
    /// descriptor index
    WebUsb {
        index: u16,
        value: u16,
    },
    Unsupported,
}
