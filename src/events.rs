//! nPM2100 event identifiers and their register layout
//!
//! Every event owns one bit in each of four register blocks of identical
//! shape: EVENTS_SET (pending, read), EVENTS_CLR (pending, write 1 to clear),
//! INTEN_SET and INTEN_CLR (interrupt enable). [`EventLayout`] describes
//! where those blocks live and where each event's bit is inside them.

use core::ops::{BitOr, BitOrAssign};

/// Number of defined nPM2100 events
pub const EVENT_COUNT: usize = 21;

/// Largest event block supported by the processor, in bytes
pub const MAX_EVENT_BLOCK_LEN: usize = 8;

/// nPM2100 event sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Npm2100Event {
    SysDieTempWarn = 0,
    SysShipholdFall = 1,
    SysShipholdRise = 2,
    SysPgResetFall = 3,
    SysPgResetRise = 4,
    SysTimerExpiry = 5,
    AdcVbatReady = 6,
    AdcDieTempReady = 7,
    AdcDroopDetect = 8,
    AdcVoutReady = 9,
    Gpio0Fall = 10,
    Gpio0Rise = 11,
    Gpio1Fall = 12,
    Gpio1Rise = 13,
    BoostVbatWarn = 14,
    BoostVoutMin = 15,
    BoostVoutWarn = 16,
    BoostVoutDps = 17,
    BoostVoutOk = 18,
    LdoswOcp = 19,
    LdoswVintFail = 20,
}

impl Npm2100Event {
    /// All events in ascending identifier order
    pub const ALL: [Npm2100Event; EVENT_COUNT] = [
        Self::SysDieTempWarn,
        Self::SysShipholdFall,
        Self::SysShipholdRise,
        Self::SysPgResetFall,
        Self::SysPgResetRise,
        Self::SysTimerExpiry,
        Self::AdcVbatReady,
        Self::AdcDieTempReady,
        Self::AdcDroopDetect,
        Self::AdcVoutReady,
        Self::Gpio0Fall,
        Self::Gpio0Rise,
        Self::Gpio1Fall,
        Self::Gpio1Rise,
        Self::BoostVbatWarn,
        Self::BoostVoutMin,
        Self::BoostVoutWarn,
        Self::BoostVoutDps,
        Self::BoostVoutOk,
        Self::LdoswOcp,
        Self::LdoswVintFail,
    ];

    pub const fn bit(self) -> u32 {
        1 << self as u8
    }

    /// Look up an event by its identifier
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

/// Position of an event bit inside each event register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventDescriptor {
    /// Byte offset from the start of the block
    pub offset: u8,
    pub mask: u8,
}

impl EventDescriptor {
    pub const fn new(offset: u8, mask: u8) -> Self {
        Self { offset, mask }
    }
}

/// Register block addresses and per-event descriptors for one silicon variant.
#[derive(Debug)]
pub struct EventLayout {
    pub events_set: u8,
    pub events_clr: u8,
    pub inten_set: u8,
    pub inten_clr: u8,
    /// Length of each block in bytes
    pub len: usize,
    pub descriptors: [EventDescriptor; EVENT_COUNT],
}

impl EventLayout {
    pub const fn descriptor(&self, event: Npm2100Event) -> EventDescriptor {
        self.descriptors[event as usize]
    }

    /// Check that every block fits in the 8-bit register space and that
    /// every descriptor points inside its block.
    pub fn is_valid(&self) -> bool {
        let len = self.len;
        let blocks_fit = [self.events_set, self.events_clr, self.inten_set, self.inten_clr]
            .iter()
            .all(|base| *base as usize + len <= 0x100);
        let offsets_fit = self
            .descriptors
            .iter()
            .all(|desc| (desc.offset as usize) < len);

        len != 0 && len <= MAX_EVENT_BLOCK_LEN && blocks_fit && offsets_fit
    }

    /// Translate a raw EVENTS_SET snapshot into the set of pending events.
    ///
    /// Bits that don't belong to a known event are ignored.
    pub fn decode(&self, block: &[u8]) -> EventSet {
        let mut set = EventSet::empty();
        for event in Npm2100Event::ALL {
            let desc = self.descriptor(event);
            let pending = block
                .get(desc.offset as usize)
                .is_some_and(|byte| byte & desc.mask != 0);
            if pending {
                set.insert(event);
            }
        }
        set
    }
}

/// nPM2100 event register layout
pub const NPM2100_EVENT_LAYOUT: EventLayout = EventLayout {
    events_set: 0x00,
    events_clr: 0x05,
    inten_set: 0x0A,
    inten_clr: 0x0F,
    len: 5,
    descriptors: [
        // SYSTEM
        EventDescriptor::new(0x00, 1 << 0),
        EventDescriptor::new(0x00, 1 << 1),
        EventDescriptor::new(0x00, 1 << 2),
        EventDescriptor::new(0x00, 1 << 3),
        EventDescriptor::new(0x00, 1 << 4),
        EventDescriptor::new(0x00, 1 << 5),
        // ADC
        EventDescriptor::new(0x01, 1 << 0),
        EventDescriptor::new(0x01, 1 << 1),
        EventDescriptor::new(0x01, 1 << 2),
        EventDescriptor::new(0x01, 1 << 3),
        // GPIO
        EventDescriptor::new(0x02, 1 << 0),
        EventDescriptor::new(0x02, 1 << 1),
        EventDescriptor::new(0x02, 1 << 2),
        EventDescriptor::new(0x02, 1 << 3),
        // BOOST
        EventDescriptor::new(0x03, 1 << 0),
        EventDescriptor::new(0x03, 1 << 1),
        EventDescriptor::new(0x03, 1 << 2),
        EventDescriptor::new(0x03, 1 << 3),
        EventDescriptor::new(0x03, 1 << 4),
        // LDOSW
        EventDescriptor::new(0x04, 1 << 0),
        EventDescriptor::new(0x04, 1 << 1),
    ],
};

/// Set of events, one bit per [`Npm2100Event`] identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventSet(u32);

impl EventSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self((1 << EVENT_COUNT) - 1)
    }

    /// Build a set from raw bits; bits above the last event are dropped
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::all().0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, event: Npm2100Event) -> bool {
        self.0 & event.bit() != 0
    }

    pub fn insert(&mut self, event: Npm2100Event) {
        self.0 |= event.bit();
    }

    pub fn remove(&mut self, event: Npm2100Event) {
        self.0 &= !event.bit();
    }

    /// Iterate the events of the set in ascending identifier order
    pub fn iter(self) -> impl Iterator<Item = Npm2100Event> {
        Npm2100Event::ALL
            .into_iter()
            .filter(move |event| self.contains(*event))
    }
}

impl From<Npm2100Event> for EventSet {
    fn from(event: Npm2100Event) -> Self {
        Self(event.bit())
    }
}

impl BitOr for EventSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOr<Npm2100Event> for EventSet {
    type Output = Self;

    fn bitor(self, rhs: Npm2100Event) -> Self {
        Self(self.0 | rhs.bit())
    }
}

impl BitOr for Npm2100Event {
    type Output = EventSet;

    fn bitor(self, rhs: Self) -> EventSet {
        EventSet(self.bit() | rhs.bit())
    }
}

impl BitOrAssign<Npm2100Event> for EventSet {
    fn bitor_assign(&mut self, rhs: Npm2100Event) {
        self.insert(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_match_table_order() {
        for (id, event) in Npm2100Event::ALL.iter().enumerate() {
            assert_eq!(*event as usize, id);
            assert_eq!(Npm2100Event::from_id(id as u8), Some(*event));
        }
        assert_eq!(Npm2100Event::from_id(EVENT_COUNT as u8), None);
    }

    #[test]
    fn descriptors_are_unique_and_inside_block() {
        let layout = &NPM2100_EVENT_LAYOUT;
        assert!(layout.is_valid());
        for (i, a) in layout.descriptors.iter().enumerate() {
            assert!((a.offset as usize) < layout.len);
            assert_eq!(a.mask.count_ones(), 1);
            for b in &layout.descriptors[i + 1..] {
                assert!(a != b);
            }
        }
    }

    #[test]
    fn layout_validation() {
        let near_top = EventLayout {
            inten_clr: 0xFC,
            ..NPM2100_EVENT_LAYOUT
        };
        assert!(!near_top.is_valid());

        let at_top = EventLayout {
            inten_clr: 0xFB,
            ..NPM2100_EVENT_LAYOUT
        };
        assert!(at_top.is_valid());

        let mut stray = NPM2100_EVENT_LAYOUT;
        stray.descriptors[3] = EventDescriptor::new(5, 1);
        assert!(!stray.is_valid());

        let oversized = EventLayout {
            len: MAX_EVENT_BLOCK_LEN + 1,
            ..NPM2100_EVENT_LAYOUT
        };
        assert!(!oversized.is_valid());
    }

    #[test]
    fn decode_translates_block_bits() {
        let layout = &NPM2100_EVENT_LAYOUT;
        let set = layout.decode(&[0x20, 0x00, 0x08, 0x11, 0x02]);
        let expected = Npm2100Event::SysTimerExpiry
            | Npm2100Event::Gpio1Rise
            | Npm2100Event::BoostVbatWarn
            | Npm2100Event::BoostVoutOk
            | Npm2100Event::LdoswVintFail;
        assert_eq!(set, expected);
    }

    #[test]
    fn decode_ignores_undefined_bits() {
        let set = NPM2100_EVENT_LAYOUT.decode(&[0xC0, 0xF0, 0xF0, 0xE0, 0xFC]);
        assert!(set.is_empty());
    }

    #[test]
    fn event_set_operations() {
        let mut set = EventSet::empty();
        set |= Npm2100Event::AdcVbatReady;
        set.insert(Npm2100Event::SysDieTempWarn);
        assert!(set.contains(Npm2100Event::AdcVbatReady));
        assert_eq!(set.bits(), 0b100_0001);

        let order: [Npm2100Event; 2] = [Npm2100Event::SysDieTempWarn, Npm2100Event::AdcVbatReady];
        assert!(set.iter().eq(order));

        set.remove(Npm2100Event::SysDieTempWarn);
        assert_eq!(set, EventSet::from(Npm2100Event::AdcVbatReady));
        assert_eq!(EventSet::from_bits_truncate(u32::MAX), EventSet::all());
    }
}
