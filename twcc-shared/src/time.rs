use std::ops::Add;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900) and the unix epoch (1970).
const NTP_UNIX_OFFSET_SECS: u64 = 0x83AA7E80;

/// Pairs a monotonic [`Instant`] with the wall clock reading taken at the same
/// moment, so later instants can be mapped onto wall clock and NTP time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemInstant {
    instant: Instant,
    duration_since_unix_epoch: Duration,
}

impl SystemInstant {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            duration_since_unix_epoch: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_else(|_| Duration::from_secs(0)),
        }
    }

    /// Builds a baseline from an explicit pair, mostly useful in tests.
    pub fn new(instant: Instant, duration_since_unix_epoch: Duration) -> Self {
        Self {
            instant,
            duration_since_unix_epoch,
        }
    }

    pub fn duration_since_unix_epoch(&self) -> Duration {
        self.duration_since_unix_epoch
    }

    pub fn unix(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.instant)
            .add(self.duration_since_unix_epoch)
    }

    pub fn ntp(&self, now: Instant) -> u64 {
        SystemInstant::unix2ntp(self.unix(now))
    }

    /// Converts a unix timestamp to 64-bit NTP fixed point (32.32).
    pub fn unix2ntp(duration_since_unix_epoch: Duration) -> u64 {
        let u = duration_since_unix_epoch.as_nanos() as u64;

        let mut s = u / 1_000_000_000;
        s += NTP_UNIX_OFFSET_SECS;
        let mut f = u % 1_000_000_000;
        f <<= 32;
        f /= 1_000_000_000;
        s <<= 32;

        s | f
    }

    pub fn ntp2unix(ntp: u64) -> Duration {
        let mut s = ntp >> 32;
        let mut f = ntp & 0xFFFFFFFF;
        f *= 1_000_000_000;
        f >>= 32;
        s -= NTP_UNIX_OFFSET_SECS;
        let u = s * 1_000_000_000 + f;

        Duration::new(u / 1_000_000_000, (u % 1_000_000_000) as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix2ntp() {
        // 2009-02-13T23:31:30Z
        let unix = Duration::from_secs(1_234_567_890);
        let ntp = SystemInstant::unix2ntp(unix);
        assert_eq!(ntp >> 32, 1_234_567_890 + NTP_UNIX_OFFSET_SECS);
        assert_eq!(ntp & 0xFFFFFFFF, 0);

        let half = SystemInstant::unix2ntp(Duration::from_millis(500));
        assert_eq!(half & 0xFFFFFFFF, 0x8000_0000);
    }

    #[test]
    fn test_ntp_round_trip_keeps_microseconds() {
        let unix = Duration::new(1_700_000_000, 123_456_000);
        let back = SystemInstant::ntp2unix(SystemInstant::unix2ntp(unix));
        let diff = if back > unix { back - unix } else { unix - back };
        assert!(diff < Duration::from_micros(1), "diff {diff:?}");
    }

    #[test]
    fn test_ntp_follows_instant() {
        let start = Instant::now();
        let base = SystemInstant::new(start, Duration::from_secs(10));
        let later = start + Duration::from_secs(2);

        assert_eq!(base.unix(later), Duration::from_secs(12));
        assert_eq!(base.ntp(later) >> 32, 12 + NTP_UNIX_OFFSET_SECS);
    }
}
