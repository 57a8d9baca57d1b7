//! Periodic hard realignment of channel timers.
//!
//! A channel whose simplified divide is `d` starts a fresh cycle exactly on
//! every `lcm(d, 1)`-th master tick. Resetting its timer there bounds the
//! floating-point drift that accumulates between boundaries.

use crate::channel::ChannelPhase;

/// Decides, at each master tick, which channel timers restart.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlignmentScheduler {
    /// Bit `i` set when channel `i` was realigned on the last master tick
    realigned: u16,
}

impl AlignmentScheduler {
    pub const fn new() -> Self {
        Self { realigned: 0 }
    }

    /// True if a channel must restart on master tick `tick_index`.
    pub fn is_due(channel: &ChannelPhase, tick_index: u64) -> bool {
        if channel.resync_requested() {
            return true;
        }
        let period = channel.ratio().alignment_period();
        period != 0 && tick_index % period as u64 == 0
    }

    /// Restart every due channel. The master (index 0) is left alone since
    /// it is sample-counted.
    pub fn on_master_tick(&mut self, tick_index: u64, channels: &mut [ChannelPhase]) {
        self.realigned = 0;
        for (i, channel) in channels.iter_mut().enumerate().skip(1) {
            if Self::is_due(channel, tick_index) {
                channel.reset();
                self.realigned |= 1 << i;
            }
        }
    }

    /// Bitmask of channels realigned on the most recent master tick.
    pub fn realigned(&self) -> u16 {
        self.realigned
    }

    pub fn was_realigned(&self, channel: usize) -> bool {
        channel < 16 && self.realigned & (1 << channel) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rc_ir::Ratio;

    fn channels(ratios: &[(u8, u8)]) -> [ChannelPhase; 4] {
        let mut out = [ChannelPhase::new(Ratio::UNITY); 4];
        for (i, &(m, d)) in ratios.iter().enumerate() {
            out[i + 1] = ChannelPhase::new(Ratio::new(m, d, true));
        }
        out
    }

    #[test]
    fn realigns_on_divide_boundaries() {
        let mut chans = channels(&[(3, 2), (1, 3), (4, 4)]);
        let mut sched = AlignmentScheduler::new();

        sched.on_master_tick(0, &mut chans);
        assert_eq!(sched.realigned(), 0b1110);

        sched.on_master_tick(1, &mut chans);
        assert!(!sched.was_realigned(1));
        assert!(!sched.was_realigned(2));
        // 4:4 simplifies to 1:1 and realigns every tick.
        assert!(sched.was_realigned(3));

        sched.on_master_tick(2, &mut chans);
        assert!(sched.was_realigned(1));
        assert!(!sched.was_realigned(2));

        sched.on_master_tick(3, &mut chans);
        assert!(sched.was_realigned(2));
    }

    #[test]
    fn resync_request_forces_realignment() {
        let mut chans = channels(&[(1, 5)]);
        chans[1].advance(0.2, 1.0);
        chans[1].request_resync();

        let mut sched = AlignmentScheduler::new();
        sched.on_master_tick(3, &mut chans);
        assert!(sched.was_realigned(1));
        assert_eq!(chans[1].timer(), 0.0);
        assert!(!chans[1].resync_requested());
    }

    #[test]
    fn disabled_channels_never_realign_on_their_own() {
        let mut chans = channels(&[(1, 0)]);
        let mut sched = AlignmentScheduler::new();
        for tick in 0..10 {
            sched.on_master_tick(tick, &mut chans);
            assert!(!sched.was_realigned(1));
        }
    }

    #[test]
    fn master_is_never_touched() {
        let mut chans = channels(&[]);
        chans[0].set_phase(0.4);
        let mut sched = AlignmentScheduler::new();
        sched.on_master_tick(0, &mut chans);
        assert!(!sched.was_realigned(0));
        assert!((chans[0].phase() - 0.4).abs() < 1e-12);
    }
}
