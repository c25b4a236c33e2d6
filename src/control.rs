//! Control request dispatch
//!
//! [`Device`] decides how to answer each classified request. It doesn't touch
//! the hardware; the driver carries out the answer.

use crate::{
    descriptors::{DescriptorTable, LandingPage},
    setup::Request,
    transmit::Payload,
};

/// `index` of the Microsoft extended compatible-ID query
const MS_COMPAT_ID_INDEX: u16 = 4;
/// `index` of the WebUSB GET_URL query
const WEBUSB_GET_URL: u16 = 2;
/// The landing page's URL descriptor index, as advertised in the BOS
const WEBUSB_LANDING_PAGE: u16 = 1;

/// Why a request was refused
///
/// Every rejection stalls the control endpoint until the next SETUP.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reject {
    /// The request is unsupported, or malformed
    ProtocolViolation,
    /// The request names an endpoint other than endpoint 0
    EndpointOutOfRange,
    /// GET_DESCRIPTOR asked for a descriptor that's not in the table
    UnrecognizedDescriptor,
}

/// How to answer an accepted request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    /// No data stage; acknowledge the status stage
    Status,
    /// Send these bytes in the data stage
    Data(Payload),
}

/// Device-wide request handling state
pub struct Device<L> {
    descriptors: &'static DescriptorTable,
    landing: L,
    configuration: u8,
}

impl<L: LandingPage> Device<L> {
    pub const fn new(descriptors: &'static DescriptorTable, landing: L) -> Self {
        Device {
            descriptors,
            landing,
            configuration: 0,
        }
    }

    /// The value set by the last SET_CONFIGURATION, or zero
    pub fn configuration(&self) -> u8 {
        self.configuration
    }

    /// Decide how to answer `request`
    ///
    /// The returned data isn't clamped to the host's requested length.
    pub fn respond(&mut self, request: &Request) -> Result<Reply, Reject> {
        match *request {
            Request::SetAddress | Request::SetInterface => Ok(Reply::Status),
            Request::SetConfiguration { value } => {
                self.configuration = value;
                debug!("CONFIGURATION {=u8}", value);
                Ok(Reply::Status)
            }
            Request::GetConfiguration => Ok(Reply::Data([self.configuration].into())),
            Request::GetDeviceStatus => Ok(Reply::Data([0u8, 0].into())),
            Request::GetEndpointStatus { endpoint } => {
                ep0_only(endpoint)?;
                Ok(Reply::Data([0u8, 0].into()))
            }
            Request::ClearEndpointFeature { endpoint, feature }
            | Request::SetEndpointFeature { endpoint, feature } => {
                ep0_only(endpoint)?;
                // ENDPOINT_HALT is the only endpoint feature, and EP0 can't halt.
                if feature != 0 {
                    return Err(Reject::ProtocolViolation);
                }
                Ok(Reply::Status)
            }
            Request::GetDescriptor { key } => self
                .descriptors
                .lookup(key)
                .map(|bytes| Reply::Data(bytes.into()))
                .ok_or(Reject::UnrecognizedDescriptor),
            Request::MicrosoftDescriptor { index } if index == MS_COMPAT_ID_INDEX => {
                Ok(Reply::Data(self.descriptors.compat_id().into()))
            }
            Request::WebUsb { index, value }
                if index == WEBUSB_GET_URL && value == WEBUSB_LANDING_PAGE =>
            {
                self.landing
                    .url()
                    .map(|bytes| Reply::Data(bytes.into()))
                    .ok_or(Reject::ProtocolViolation)
            }
            Request::MicrosoftDescriptor { .. } | Request::WebUsb { .. } | Request::Unsupported => {
                Err(Reject::ProtocolViolation)
            }
        }
    }
}

fn ep0_only(endpoint: u16) -> Result<(), Reject> {
    if endpoint != 0 {
        Err(Reject::EndpointOutOfRange)
    } else {
        Ok(())
    }
}
