//! Radio protocol families an XBee module may run, and how to recognize them from the
//! hardware (`HV`) and firmware (`VR`) versions the module reports.

use std::fmt;

/// Protocol identity of a module.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum XBeeProtocol {
    ZigBee,
    Raw802,
    XBeeWiFi,
    DigiMesh,
    SmartEnergy,
    DigiPoint,
    ZNet,
    Unknown,
}

/// Hardware series codes, as reported in the high byte of `HV`.
mod hardware {
    pub const XB24_AXX_XX: u8 = 0x17;
    pub const XBP24_AXX_XX: u8 = 0x18;
    pub const XB24_BXIX_XXX: u8 = 0x19;
    pub const XBP24_BXIX_XXX: u8 = 0x1A;
    pub const XBP09_DXIX_XXX: u8 = 0x1B;
    pub const XBP08_DXXX_XXX: u8 = 0x1D;
    pub const XBP24B: u8 = 0x1E;
    pub const XB24_WF: u8 = 0x1F;
    pub const XBP24C: u8 = 0x21;
    pub const XB24C: u8 = 0x22;
    /// Anything below this code predates API mode modules.
    pub const FIRST_API_SERIES: u8 = 0x09;
}

impl XBeeProtocol {
    /// Numeric code of the protocol.
    pub fn code(&self) -> u8 {
        match self {
            XBeeProtocol::ZigBee => 0,
            XBeeProtocol::Raw802 => 1,
            XBeeProtocol::XBeeWiFi => 2,
            XBeeProtocol::DigiMesh => 3,
            XBeeProtocol::SmartEnergy => 7,
            XBeeProtocol::DigiPoint => 8,
            XBeeProtocol::ZNet => 9,
            XBeeProtocol::Unknown => 99,
        }
    }

    /// Human-readable name, used in every user facing message.
    pub fn description(&self) -> &'static str {
        match self {
            XBeeProtocol::ZigBee => "ZigBee",
            XBeeProtocol::Raw802 => "802.15.4",
            XBeeProtocol::XBeeWiFi => "Wi-Fi",
            XBeeProtocol::DigiMesh => "DigiMesh",
            XBeeProtocol::SmartEnergy => "Smart Energy",
            XBeeProtocol::DigiPoint => "Point-to-multipoint",
            XBeeProtocol::ZNet => "ZNet 2.5",
            XBeeProtocol::Unknown => "Unknown",
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => XBeeProtocol::ZigBee,
            1 => XBeeProtocol::Raw802,
            2 => XBeeProtocol::XBeeWiFi,
            3 => XBeeProtocol::DigiMesh,
            7 => XBeeProtocol::SmartEnergy,
            8 => XBeeProtocol::DigiPoint,
            9 => XBeeProtocol::ZNet,
            _ => XBeeProtocol::Unknown,
        }
    }

    /// Whether the protocol assigns meaningful 16-bit network addresses.
    pub fn uses_16bit_addresses(&self) -> bool {
        matches!(
            self,
            XBeeProtocol::ZigBee
                | XBeeProtocol::Raw802
                | XBeeProtocol::SmartEnergy
                | XBeeProtocol::ZNet
        )
    }

    /// Determines the protocol from the hardware series (high byte of `HV`) and the firmware
    /// version (`VR` as an upper-case hexadecimal string, e.g. `"8075"`).
    ///
    /// Series this library does not know about map to [XBeeProtocol::Unknown].
    pub fn determine(hardware_series: u8, firmware: &str) -> Self {
        use hardware::*;

        if hardware_series < FIRST_API_SERIES || firmware.is_empty() {
            return XBeeProtocol::Unknown;
        }
        let second_is_8 = firmware.chars().nth(1) == Some('8');
        match hardware_series {
            XB24_AXX_XX | XBP24_AXX_XX => {
                if firmware.len() == 4 && firmware.starts_with('8') {
                    XBeeProtocol::DigiMesh
                } else {
                    XBeeProtocol::Raw802
                }
            }
            XB24_BXIX_XXX | XBP24_BXIX_XXX => {
                if (firmware.starts_with('1') && firmware.ends_with("20"))
                    || firmware.starts_with('2')
                {
                    XBeeProtocol::ZigBee
                } else if firmware.starts_with('3') {
                    XBeeProtocol::SmartEnergy
                } else {
                    XBeeProtocol::ZNet
                }
            }
            XBP09_DXIX_XXX => {
                if firmware.starts_with('8')
                    || ((firmware.len() == 4 || firmware.len() == 5) && second_is_8)
                {
                    XBeeProtocol::DigiMesh
                } else {
                    XBeeProtocol::DigiPoint
                }
            }
            XBP08_DXXX_XXX => XBeeProtocol::DigiPoint,
            XBP24B => {
                if firmware.starts_with('3') {
                    XBeeProtocol::SmartEnergy
                } else {
                    XBeeProtocol::ZigBee
                }
            }
            XB24_WF => XBeeProtocol::XBeeWiFi,
            XBP24C | XB24C => {
                if firmware.starts_with('5') {
                    XBeeProtocol::SmartEnergy
                } else if firmware.starts_with('9') {
                    XBeeProtocol::DigiMesh
                } else if firmware.starts_with("20") {
                    XBeeProtocol::Raw802
                } else {
                    XBeeProtocol::ZigBee
                }
            }
            _ => XBeeProtocol::Unknown,
        }
    }
}

impl fmt::Display for XBeeProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
