//! Board identification.
//!
//! The bring-up driver hands us the device-tree name of the board it is
//! booting; rail quirks are gated on exact matches against the small set
//! of names we know. Unknown names get the generic profile.

use strum::{Display, EnumString};

/// Boards with rail quirks or display power sequences of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
pub enum Board {
    #[strum(serialize = "sun50i-a64-pine64-plus")]
    Pine64Plus,
    #[strum(serialize = "sun50i-a64-pinebook")]
    Pinebook,
    #[strum(serialize = "sun50i-a64-teres-i")]
    TeresI,
}

impl Board {
    /// Exact-match lookup; `None` selects the generic profile.
    pub fn from_dt_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert_eq!(Board::from_dt_name("sun50i-a64-pine64-plus"), Some(Board::Pine64Plus));
        assert_eq!(Board::from_dt_name("sun50i-a64-pinebook"), Some(Board::Pinebook));
        assert_eq!(Board::from_dt_name("sun50i-a64-teres-i"), Some(Board::TeresI));
    }

    #[test]
    fn matching_is_exact() {
        assert_eq!(Board::from_dt_name("sun50i-a64-pine64"), None);
        assert_eq!(Board::from_dt_name("SUN50I-A64-PINE64-PLUS"), None);
        assert_eq!(Board::from_dt_name(""), None);
    }
}
