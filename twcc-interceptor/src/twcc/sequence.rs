/// Sequence numbers below this are candidates for having wrapped.
const WRAP_LOW: u16 = 0x0fff;
/// The previous sequence number must be above this for a wrap to be detected.
const WRAP_HIGH: u16 = 0xf000;
const CYCLE: u32 = 0x10000;

/// Turns 16-bit transport sequence numbers into 32-bit ones that keep
/// increasing across wraps.
///
/// A wrap is only detected when the previous number was in the top 4K of the
/// range and the new one is in the bottom 4K. Reordering across the wrap by
/// more than that window is mis-extended.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SequenceExtender {
    cycles: u32,
    last_sequence_number: u16,
}

impl SequenceExtender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends `seq`, given in arrival order.
    pub fn extend(&mut self, seq: u16) -> u32 {
        if seq < WRAP_LOW && self.last_sequence_number > WRAP_HIGH {
            self.cycles = self.cycles.wrapping_add(CYCLE);
        }
        self.last_sequence_number = seq;
        self.cycles | seq as u32
    }

    /// Wrap count so far, as a multiple of 0x10000.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_in_order() {
        let mut ext = SequenceExtender::new();
        assert_eq!(ext.extend(0), 0);
        assert_eq!(ext.extend(1), 1);
        assert_eq!(ext.extend(100), 100);
        assert_eq!(ext.cycles(), 0);
    }

    #[test]
    fn test_extend_across_wrap() {
        let mut ext = SequenceExtender::new();
        assert_eq!(ext.extend(65530), 65530);
        assert_eq!(ext.extend(5), 0x10000 + 5);
        assert_eq!(ext.extend(6), 0x10000 + 6);
        assert_eq!(ext.cycles(), 0x10000);
    }

    #[test]
    fn test_extend_strictly_increasing_over_many_cycles() {
        let mut ext = SequenceExtender::new();
        let mut prev = None;
        for i in 0..(3 * 65536u32 + 17) {
            let seq = i as u16;
            let extended = ext.extend(seq);
            assert_eq!(extended, ext.cycles() + seq as u32);
            if let Some(p) = prev {
                assert!(extended > p);
            }
            prev = Some(extended);
        }
        assert_eq!(ext.cycles(), 3 * 0x10000);
    }

    #[test]
    fn test_extend_thresholds_are_exact() {
        // 0x0fff itself is not low enough
        let mut ext = SequenceExtender::new();
        ext.extend(0xffff);
        assert_eq!(ext.extend(0x0fff), 0x0fff);

        // 0xf000 itself is not high enough
        let mut ext = SequenceExtender::new();
        ext.extend(0xf000);
        assert_eq!(ext.extend(0), 0);

        let mut ext = SequenceExtender::new();
        ext.extend(0xf001);
        assert_eq!(ext.extend(0x0ffe), 0x10000 + 0x0ffe);
    }

    #[test]
    fn test_extend_reordering_inside_window() {
        let mut ext = SequenceExtender::new();
        ext.extend(65534);
        assert_eq!(ext.extend(1), 0x10001);
        // late packet from before the wrap lands in the new cycle
        assert_eq!(ext.extend(65535), 0x1ffff);
    }
}
