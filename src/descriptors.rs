//! Static descriptor data
//!
//! The control endpoint serves descriptors verbatim; it never builds or
//! re-encodes them. A [`DescriptorTable`] maps the `(type, index)` key of a
//! GET_DESCRIPTOR request onto bytes, and also holds the Microsoft
//! compatible-ID descriptor returned by the vendor query.
//!
//! The WebUSB landing page is optional. Supply it through a [`LandingPage`]
//! implementation, or use [`NoLandingPage`] to reject those queries.

use usb_device::descriptor::descriptor_type;

/// The `(type, index)` key of a GET_DESCRIPTOR request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorKey {
    /// Descriptor type; see `usb_device::descriptor::descriptor_type`
    pub kind: u8,
    pub index: u8,
}

impl DescriptorKey {
    pub const fn new(kind: u8, index: u8) -> Self {
        DescriptorKey { kind, index }
    }

    /// Unpack the `value` field of a GET_DESCRIPTOR request
    ///
    /// The type is in the high byte, and the index is in the low byte.
    pub const fn from_value(value: u16) -> Self {
        DescriptorKey {
            kind: (value >> 8) as u8,
            index: value as u8,
        }
    }
}

/// Immutable descriptor data for one device
#[derive(Clone, Copy, Debug)]
pub struct DescriptorTable {
    entries: &'static [(DescriptorKey, &'static [u8])],
    compat_id: &'static [u8],
}

impl DescriptorTable {
    /// Create a table from GET_DESCRIPTOR entries, and the Microsoft
    /// compatible-ID descriptor
    ///
    /// The first entry wins if keys repeat.
    pub const fn new(
        entries: &'static [(DescriptorKey, &'static [u8])],
        compat_id: &'static [u8],
    ) -> Self {
        DescriptorTable { entries, compat_id }
    }

    /// Find the descriptor for `key`
    pub fn lookup(&self, key: DescriptorKey) -> Option<&'static [u8]> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, bytes)| *bytes)
    }

    /// The Microsoft extended compatible-ID descriptor
    pub fn compat_id(&self) -> &'static [u8] {
        self.compat_id
    }
}

/// Provides the WebUSB landing page URL descriptor
pub trait LandingPage {
    /// Returns the URL descriptor, or `None` if there's no landing page
    fn url(&self) -> Option<&'static [u8]>;
}

/// No landing page; WebUSB queries stall
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLandingPage;

impl LandingPage for NoLandingPage {
    fn url(&self) -> Option<&'static [u8]> {
        None
    }
}

/// A fixed WebUSB URL descriptor
///
/// ```
/// use epfifo_ep0::descriptors::{LandingPage, UrlDescriptor};
///
/// // https://dfu.tomu.im
/// static URL: &[u8] = &[
///     0x0e, 0x03, 0x01, b'd', b'f', b'u', b'.', b't', b'o', b'm', b'u', b'.', b'i', b'm',
/// ];
/// let page = UrlDescriptor::new(URL);
/// assert_eq!(page.url(), Some(URL));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct UrlDescriptor(&'static [u8]);

impl UrlDescriptor {
    pub const fn new(bytes: &'static [u8]) -> Self {
        UrlDescriptor(bytes)
    }
}

impl LandingPage for UrlDescriptor {
    fn url(&self) -> Option<&'static [u8]> {
        Some(self.0)
    }
}

const MS_OS_STRING_INDEX: u8 = 0xEE;

static DEVICE: [u8; 18] = [
    0x12, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x40, 0x09, 0x12, 0xf0, 0x5b, 0x01, 0x01, 0x01, 0x02,
    0x00, 0x01,
];

static CONFIGURATION: [u8; 18] = [
    0x09, 0x02, 0x12, 0x00, 0x01, 0x01, 0x01, 0x80, 0x32, 0x09, 0x04, 0x00, 0x00, 0x00, 0xfe, 0x00,
    0x00, 0x02,
];

static LANGUAGES: [u8; 4] = [0x04, 0x03, 0x09, 0x04];

/// "Foosn"
static MANUFACTURER: [u8; 14] = [
    0x0e, 0x03, 0x46, 0x00, 0x6f, 0x00, 0x6f, 0x00, 0x73, 0x00, 0x6e, 0x00, 0x00, 0x00,
];

/// "Fomu Updater"
static PRODUCT: [u8; 26] = [
    0x1a, 0x03, 0x46, 0x00, 0x6f, 0x00, 0x6d, 0x00, 0x75, 0x00, 0x20, 0x00, 0x55, 0x00, 0x70, 0x00,
    0x64, 0x00, 0x61, 0x00, 0x74, 0x00, 0x65, 0x00, 0x72, 0x00,
];

/// "MSFT100", followed by the Microsoft vendor code `~`
static MS_OS_STRING: [u8; 18] = [
    18, 3, b'M', b'S', b'F', b'T', b'1', b'0', b'0', b'~', 0, 0, 0, 0, 0, 0, 0, 0,
];

/// One WebUSB platform capability: vendor code 2, landing page 1
static BOS: [u8; 29] = [
    0x05, 0x0f, 0x1d, 0x00, 0x01, 0x18, 0x10, 0x05, 0x00, 0x38, 0xb6, 0x08, 0x34, 0xa9, 0x09, 0xa0,
    0x47, 0x8b, 0xfd, 0xa0, 0x76, 0x88, 0x15, 0xb6, 0x65, 0x00, 0x01, 0x02, 0x01,
];

/// Binds interface 0 to the WINUSB driver
static MS_COMPAT_ID: [u8; 40] = [
    0x28, 0x00, 0x00, 0x00, 0x00, 0x01, 0x04, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x57, 0x49, 0x4e, 0x55, 0x53, 0x42, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

static UPDATER_ENTRIES: [(DescriptorKey, &[u8]); 7] = [
    (DescriptorKey::new(descriptor_type::DEVICE, 0), &DEVICE),
    (DescriptorKey::new(descriptor_type::CONFIGURATION, 0), &CONFIGURATION),
    (DescriptorKey::new(descriptor_type::STRING, 0), &LANGUAGES),
    (DescriptorKey::new(descriptor_type::STRING, 1), &MANUFACTURER),
    (DescriptorKey::new(descriptor_type::STRING, 2), &PRODUCT),
    (DescriptorKey::new(descriptor_type::STRING, MS_OS_STRING_INDEX), &MS_OS_STRING),
    (DescriptorKey::new(descriptor_type::BOS, 0), &BOS),
];

/// Descriptors for a single-interface, vendor-specific updater device
///
/// VID:PID `1209:5bf0`, one configuration with one interface and no
/// endpoints beyond EP0. Advertises the WINUSB compatible ID with the default
/// Microsoft vendor code, and a WebUSB landing page with the default WebUSB
/// vendor code. See [`VendorCodes`](crate::VendorCodes).
pub static UPDATER: DescriptorTable = DescriptorTable::new(&UPDATER_ENTRIES, &MS_COMPAT_ID);

#[cfg(test)]
mod tests {
    use super::{DescriptorKey, DescriptorTable, LandingPage, NoLandingPage, UrlDescriptor, UPDATER};
    use crate::config::VendorCodes;

    #[test]
    fn key_from_value() {
        assert_eq!(DescriptorKey::from_value(0x0302), DescriptorKey::new(3, 2));
        assert_eq!(DescriptorKey::from_value(0x03EE), DescriptorKey::new(3, 0xEE));
        assert_eq!(DescriptorKey::from_value(0x0F00), DescriptorKey::new(0x0F, 0));
    }

    #[test]
    fn updater_lengths_match_headers() {
        for key in [
            DescriptorKey::new(1, 0),
            DescriptorKey::new(3, 0),
            DescriptorKey::new(3, 1),
            DescriptorKey::new(3, 2),
            DescriptorKey::new(3, 0xEE),
        ] {
            let bytes = UPDATER.lookup(key).unwrap();
            assert_eq!(bytes[0] as usize, bytes.len(), "{:?}", key);
            assert_eq!(bytes[1], key.kind);
        }
        // Configuration and BOS carry a wTotalLength
        for kind in [2, 0x0F] {
            let bytes = UPDATER.lookup(DescriptorKey::new(kind, 0)).unwrap();
            assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]) as usize, bytes.len());
        }
        let compat_id = UPDATER.compat_id();
        assert_eq!(compat_id[0] as usize, compat_id.len());
        assert_eq!(&compat_id[18..24], b"WINUSB");
    }

    #[test]
    fn updater_vendor_codes_agree() {
        let vendor = VendorCodes::default();
        let ms = UPDATER.lookup(DescriptorKey::new(3, 0xEE)).unwrap();
        assert_eq!(ms[9], vendor.microsoft);
        let bos = UPDATER.lookup(DescriptorKey::new(0x0F, 0)).unwrap();
        assert_eq!(bos[bos.len() - 2], vendor.webusb);
    }

    #[test]
    fn lookup_misses() {
        assert!(UPDATER.lookup(DescriptorKey::new(3, 3)).is_none());
        assert!(UPDATER.lookup(DescriptorKey::new(6, 0)).is_none());
        assert!(UPDATER.lookup(DescriptorKey::new(1, 1)).is_none());
    }

    #[test]
    fn first_entry_wins() {
        static ENTRIES: [(DescriptorKey, &[u8]); 2] = [
            (DescriptorKey::new(1, 0), &[1]),
            (DescriptorKey::new(1, 0), &[2]),
        ];
        let table = DescriptorTable::new(&ENTRIES, &[]);
        assert_eq!(table.lookup(DescriptorKey::new(1, 0)), Some(&[1u8][..]));
        assert!(table.compat_id().is_empty());
    }

    #[test]
    fn landing_pages() {
        assert!(NoLandingPage.url().is_none());
        static URL: [u8; 3] = [3, 3, 1];
        assert_eq!(UrlDescriptor::new(&URL).url(), Some(&URL[..]));
    }
}
