//! Platform visibility masks

use std::fmt;

/// A compilation target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Client,
    Server,
}

impl Platform {
    /// The mask containing only this platform
    pub fn mask(self) -> PlatformMask {
        match self {
            Platform::Client => PlatformMask::CLIENT,
            Platform::Server => PlatformMask::SERVER,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Client => write!(f, "client"),
            Platform::Server => write!(f, "server"),
        }
    }
}

/// Bitset over {Client, Server} controlling whether a field or enum is
/// emitted for a given compilation target.
///
/// An empty mask keeps the field in the header model but excludes it from
/// every emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlatformMask(u8);

impl PlatformMask {
    pub const EMPTY: PlatformMask = PlatformMask(0);
    pub const CLIENT: PlatformMask = PlatformMask(1);
    pub const SERVER: PlatformMask = PlatformMask(2);
    pub const ALL: PlatformMask = PlatformMask(3);

    /// Parse the two-letter platform code from a platform header cell.
    ///
    /// `c` -> Client, `s` -> Server, `cs` -> All (case-insensitive);
    /// anything else is the empty mask.
    pub fn parse(code: &str) -> PlatformMask {
        match code.trim().to_ascii_lowercase().as_str() {
            "c" => PlatformMask::CLIENT,
            "s" => PlatformMask::SERVER,
            "cs" => PlatformMask::ALL,
            _ => PlatformMask::EMPTY,
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether this mask includes the given target
    pub fn contains(self, platform: Platform) -> bool {
        self.0 & platform.mask().0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_codes() {
        assert_eq!(PlatformMask::parse("c"), PlatformMask::CLIENT);
        assert_eq!(PlatformMask::parse("S"), PlatformMask::SERVER);
        assert_eq!(PlatformMask::parse("cs"), PlatformMask::ALL);
        assert_eq!(PlatformMask::parse("CS"), PlatformMask::ALL);
        assert_eq!(PlatformMask::parse(""), PlatformMask::EMPTY);
        assert_eq!(PlatformMask::parse("sc"), PlatformMask::EMPTY);
    }

    #[test]
    fn contains_targets() {
        assert!(PlatformMask::ALL.contains(Platform::Client));
        assert!(PlatformMask::ALL.contains(Platform::Server));
        assert!(PlatformMask::CLIENT.contains(Platform::Client));
        assert!(!PlatformMask::CLIENT.contains(Platform::Server));
        assert!(!PlatformMask::EMPTY.contains(Platform::Client));
        assert!(!PlatformMask::EMPTY.contains(Platform::Server));
    }
}
