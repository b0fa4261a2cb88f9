//! Self rescheduling frame task that drives the playback clock
use crate::clock::PlaybackClock;
use log::trace;

/// Identifies a single pending frame request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Advances a clock once per frame until cancelled.
///
/// Only one frame request is pending at any time. Each serviced frame registers
/// the next one, and cancelling drops the pending request so that any callback
/// still holding the old handle becomes a no-op.
#[derive(Debug)]
pub struct Animation {
    clock: PlaybackClock,
    pending: Option<FrameHandle>,
    next_id: u64,
}

impl Animation {
    /// Take ownership of the clock and request the first frame
    pub fn start(clock: PlaybackClock) -> Self {
        let mut animation = Animation {
            clock,
            pending: None,
            next_id: 0,
        };
        animation.request_frame();
        animation
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id);
        self.next_id += 1;
        self.pending = Some(handle);
        handle
    }

    /// Service a frame, returns false without touching the clock for stale or cancelled handles
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        if self.pending != Some(handle) {
            trace!("ignoring stale frame request {:?}", handle);
            return false;
        }
        self.clock.tick();
        self.request_frame();
        true
    }

    /// Handle of the frame that will be serviced next, if the animation is running
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending frame request, calling this more than once is harmless
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            trace!("cancelled frame request {:?}", handle);
        }
    }

    /// Start requesting frames again after a cancel
    pub fn resume(&mut self) {
        if self.pending.is_none() {
            self.request_frame();
        }
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::PlaybackSettings;

    fn animation() -> Animation {
        Animation::start(PlaybackClock::new(PlaybackSettings::default()))
    }

    #[test]
    fn each_frame_ticks_once() {
        let mut anim = animation();
        for _ in 0..10 {
            let handle = anim.pending().unwrap();
            assert!(anim.on_frame(handle));
        }
        assert!((anim.clock().current() - 421.0).abs() < 1e-9);
    }

    #[test]
    fn stale_handles_are_ignored() {
        let mut anim = animation();
        let first = anim.pending().unwrap();
        assert!(anim.on_frame(first));
        let time = anim.clock().current();
        assert!(!anim.on_frame(first));
        assert_eq!(anim.clock().current(), time);
    }

    #[test]
    fn no_tick_after_cancel() {
        let mut anim = animation();
        let handle = anim.pending().unwrap();
        anim.cancel();
        anim.cancel();
        assert!(!anim.is_running());
        assert!(!anim.on_frame(handle));
        assert_eq!(anim.clock().current(), 420.0);
    }

    #[test]
    fn resume_issues_a_fresh_handle() {
        let mut anim = animation();
        let old = anim.pending().unwrap();
        anim.cancel();
        anim.resume();
        let new = anim.pending().unwrap();
        assert_ne!(old, new);
        assert!(!anim.on_frame(old));
        assert!(anim.on_frame(new));
    }
}
