//! Firmware revision detection
//!
//! The firmware string looks like `OPC-N2 FirmwareVer=OPC-018.2....BD`. The
//! revision number picks the histogram decoder.

use crate::decode::{self, Histogram};
use crate::error::{Opcn2Error, Result};
use crate::protocol::{FIRMWARE_LEN, HISTOGRAM_LEN};

const VERSION_PREFIX: &str = "OPC-N2 FirmwareVer=OPC";
const VERSION_SUFFIX: &str = "BD";

/// Supported firmware revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firmware {
    V16,
    V17,
    V18,
}

impl Firmware {
    /// Revisions in the order they are tried
    pub const ALL: [Firmware; 3] = [Firmware::V16, Firmware::V17, Firmware::V18];

    /// Revision number as it appears in the version string
    pub fn revision(&self) -> &'static str {
        match self {
            Firmware::V16 => "16",
            Firmware::V17 => "17",
            Firmware::V18 => "18",
        }
    }

    /// Whether a version string names this revision
    ///
    /// On a single line: the prefix, then the revision digits somewhere after
    /// it, then `BD` somewhere after those.
    pub fn matches(&self, version: &str) -> bool {
        version
            .lines()
            .any(|line| contains_in_order(line, &[VERSION_PREFIX, self.revision(), VERSION_SUFFIX]))
    }

    /// Pick the revision for a version string
    pub fn detect(version: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|fw| fw.matches(version))
            .ok_or_else(|| Opcn2Error::UnknownFirmware(version.to_string()))
    }

    /// Decode a histogram block for this revision
    ///
    /// Revisions 16 to 18 share one layout.
    pub fn decode_histogram(&self, data: &[u8; HISTOGRAM_LEN]) -> Result<Histogram> {
        match self {
            Firmware::V16 | Firmware::V17 | Firmware::V18 => decode::decode_histogram(data),
        }
    }
}

impl core::fmt::Display for Firmware {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OPC-N2 firmware {}", self.revision())
    }
}

/// Turn the raw version block into text, dropping NUL and space padding
pub fn version_string(raw: &[u8; FIRMWARE_LEN]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\0', ' '])
        .to_string()
}

fn contains_in_order(haystack: &str, needles: &[&str]) -> bool {
    let mut rest = haystack;
    for needle in needles {
        match rest.find(needle) {
            Some(pos) => rest = &rest[pos + needle.len()..],
            None => return false,
        }
    }
    true
}
