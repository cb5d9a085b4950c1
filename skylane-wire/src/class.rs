use std::{cmp::Ordering, fmt};

/// The priority category of a packet.
///
/// Every class carries two independent numbers:
/// - [`TrafficClass::code`]: the numeric code used when the class is reported or exchanged.
///   `Control` has the highest code even though it is the most urgent class.
/// - [`TrafficClass::precedence`]: the dequeue rank. Lower precedence is served first.
///
/// [`Ord`] follows precedence, never the numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrafficClass {
    /// VoIP, gaming. Lowest latency user traffic.
    RealTime = 0,
    /// Video and audio streams.
    Streaming = 1,
    /// Downloads and updates. Best effort.
    Bulk = 2,
    /// Satellite control plane. Always served first.
    Control = 3,
}

impl TrafficClass {
    /// Number of traffic classes.
    pub const COUNT: usize = 4;

    /// All classes, in precedence order.
    pub const ALL: [Self; Self::COUNT] =
        [Self::Control, Self::RealTime, Self::Streaming, Self::Bulk];

    /// Returns the numeric code of this class.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the dequeue rank of this class: `Control` first, then `RealTime`, `Streaming`
    /// and `Bulk`.
    #[inline]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Control => 0,
            Self::RealTime => 1,
            Self::Streaming => 2,
            Self::Bulk => 3,
        }
    }

    /// Returns the lowercase name of the class.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RealTime => "real_time",
            Self::Streaming => "streaming",
            Self::Bulk => "bulk",
            Self::Control => "control",
        }
    }
}

impl TryFrom<u8> for TrafficClass {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::RealTime),
            1 => Ok(Self::Streaming),
            2 => Ok(Self::Bulk),
            3 => Ok(Self::Control),
            _ => Err(value),
        }
    }
}

impl Ord for TrafficClass {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence().cmp(&other.precedence())
    }
}

impl PartialOrd for TrafficClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
