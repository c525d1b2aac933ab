//! Sorted buffer of packet arrivals awaiting the next feedback report.

/// Arrival of one packet, keyed by its extended transport sequence number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PacketArrival {
    pub extended_sequence: u32,
    /// Arrival time in microseconds.
    pub arrival_time: i64,
}

impl PacketArrival {
    pub fn new(extended_sequence: u32, arrival_time: i64) -> Self {
        Self {
            extended_sequence,
            arrival_time,
        }
    }
}

/// Arrivals recorded since the last drain, kept strictly ascending by
/// extended sequence number with no duplicate keys.
///
/// Inserts scan backward from the tail, so near-sorted input costs O(1) per
/// packet. A repeated key overwrites the stored arrival time.
#[derive(Debug, Default, Clone)]
pub struct ArrivalLedger {
    arrivals: Vec<PacketArrival>,
}

impl ArrivalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, arrival: PacketArrival) {
        let key = arrival.extended_sequence;
        let mut pos = self.arrivals.len();
        while pos > 0 {
            let prev = &mut self.arrivals[pos - 1];
            if prev.extended_sequence == key {
                prev.arrival_time = arrival.arrival_time;
                return;
            }
            if prev.extended_sequence < key {
                break;
            }
            pos -= 1;
        }
        self.arrivals.insert(pos, arrival);
    }

    /// Takes every arrival out, in ascending order, leaving the ledger empty.
    pub fn drain_sorted(&mut self) -> Vec<PacketArrival> {
        std::mem::take(&mut self.arrivals)
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, extended_sequence: u32) -> Option<&PacketArrival> {
        self.arrivals
            .binary_search_by_key(&extended_sequence, |a| a.extended_sequence)
            .ok()
            .map(|i| &self.arrivals[i])
    }
}
