//! Captured packet representation.

use std::sync::OnceLock;
use std::time::{Instant, SystemTime};

use bytes::Bytes;

use crate::error::DomainError;

/// Direction of a captured packet relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    ToServer = 0,
    ToClient = 1,
}

impl Direction {
    /// The other direction.
    pub fn opposite(self) -> Self {
        match self {
            Direction::ToServer => Direction::ToClient,
            Direction::ToClient => Direction::ToServer,
        }
    }

    /// Return a string representation of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToServer => "to_server",
            Direction::ToClient => "to_client",
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::ToServer),
            1 => Ok(Direction::ToClient),
            other => Err(DomainError::InvalidDirection(other)),
        }
    }
}

bitflags::bitflags! {
    /// Capture flags attached to a packet.
    ///
    /// `PacketFlags::NONE` is the empty set and `PacketFlags::ALL` the union.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PacketFlags: u8 {
        /// Packet was injected by the capture tool, not seen on the wire.
        const CUSTOM = 0b0000_0001;
        /// Packet was captured while the stream was frozen.
        const FREEZED = 0b0000_0010;
        /// Packet carries trailing bytes past the last frame.
        const TRAILING = 0b0000_0100;
        /// Packet is one fragment of a larger message.
        const FRAGMENTED = 0b0000_1000;
    }
}

impl PacketFlags {
    pub const NONE: Self = Self::empty();
    pub const ALL: Self = Self::all();
}

/// Process-wide origin for monotonic tick counts.
fn tick_origin() -> Instant {
    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    *ORIGIN.get_or_init(Instant::now)
}

/// Milliseconds elapsed on the monotonic clock since the first packet of this process.
pub fn current_ticks() -> u64 {
    tick_origin().elapsed().as_millis() as u64
}

/// A captured packet. Immutable once created.
#[derive(Debug, Clone)]
pub struct Packet {
    data: Bytes,
    direction: Direction,
    flags: PacketFlags,
    arrival_time: SystemTime,
    arrival_ticks: u64,
}

impl Packet {
    /// Create a packet stamped with the current time.
    pub fn new(data: impl Into<Bytes>, direction: Direction, flags: PacketFlags) -> Self {
        Self::with_arrival(data, direction, flags, SystemTime::now(), current_ticks())
    }

    /// Create a packet with an explicit arrival time and tick count.
    pub fn with_arrival(
        data: impl Into<Bytes>,
        direction: Direction,
        flags: PacketFlags,
        arrival_time: SystemTime,
        arrival_ticks: u64,
    ) -> Self {
        Self {
            data: data.into(),
            direction,
            flags,
            arrival_time,
            arrival_ticks,
        }
    }

    /// Raw packet bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw packet bytes as a cheaply cloneable buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn flags(&self) -> PacketFlags {
        self.flags
    }

    /// Wall-clock arrival time.
    pub fn arrival_time(&self) -> SystemTime {
        self.arrival_time
    }

    /// Monotonic arrival tick count in milliseconds.
    pub fn arrival_ticks(&self) -> u64 {
        self.arrival_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::ToServer.opposite(), Direction::ToClient);
        assert_eq!(Direction::ToClient.opposite(), Direction::ToServer);
        assert_eq!(Direction::ToServer.opposite().opposite(), Direction::ToServer);
    }

    #[test]
    fn test_direction_from_raw() {
        assert_eq!(Direction::try_from(0), Ok(Direction::ToServer));
        assert_eq!(Direction::try_from(1), Ok(Direction::ToClient));
        assert_eq!(
            Direction::try_from(2),
            Err(DomainError::InvalidDirection(2))
        );
    }

    #[test]
    fn test_flags_combine() {
        let flags = PacketFlags::TRAILING | PacketFlags::FRAGMENTED;
        assert!(flags.contains(PacketFlags::TRAILING));
        assert!(!flags.contains(PacketFlags::CUSTOM));
        assert!(PacketFlags::NONE.is_empty());
        assert_eq!(
            PacketFlags::ALL,
            PacketFlags::CUSTOM
                | PacketFlags::FREEZED
                | PacketFlags::TRAILING
                | PacketFlags::FRAGMENTED
        );
    }

    #[test]
    fn test_packet_properties() {
        let packet = Packet::new(vec![1u8, 2, 3], Direction::ToClient, PacketFlags::CUSTOM);
        assert_eq!(packet.data(), &[1, 2, 3]);
        assert_eq!(packet.len(), 3);
        assert!(!packet.is_empty());
        assert_eq!(packet.direction(), Direction::ToClient);
        assert_eq!(packet.flags(), PacketFlags::CUSTOM);
    }

    #[test]
    fn test_ticks_are_monotonic() {
        let first = Packet::new(Vec::<u8>::new(), Direction::ToServer, PacketFlags::NONE);
        let second = Packet::new(Vec::<u8>::new(), Direction::ToServer, PacketFlags::NONE);
        assert!(second.arrival_ticks() >= first.arrival_ticks());
        assert!(first.is_empty());
    }
}
