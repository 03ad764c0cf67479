//! Continuous animation loop tied to the host's frame callback.
//!
//! The scheduler is a two-state machine (`Idle`, `Running`). While running
//! it keeps at most one frame request outstanding with the host. A frame
//! tick takes the pending request, the caller does the frame's work, and
//! only then is the next request issued.

use std::sync::atomic::{AtomicU64, Ordering};

/// Handle to a single frame request issued by a [`FrameHost`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

impl FrameRequest {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        FrameRequest(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Something that can deliver a frame callback later.
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameRequest;
    /// A cancelled request must never be delivered
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Frame host backed by egui's repaint requests.
///
/// egui has no cancellable callback, so the host remembers the one
/// outstanding request and hands it out from `take_due` on the next update.
pub struct RepaintHost {
    ctx: egui::Context,
    outstanding: Option<FrameRequest>,
}

impl RepaintHost {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            outstanding: None,
        }
    }

    /// Request due for delivery in this update, if any
    pub fn take_due(&mut self) -> Option<FrameRequest> {
        self.outstanding.take()
    }
}

impl FrameHost for RepaintHost {
    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest::next();
        self.outstanding = Some(request);
        self.ctx.request_repaint();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.outstanding == Some(request) {
            self.outstanding = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// `pending` is `None` only while a frame's work is in progress
    Running { pending: Option<FrameRequest> },
}

/// One delivered frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub time: f64,
    pub frame: u64,
}

#[derive(Debug)]
pub struct RenderScheduler {
    state: SchedulerState,
    frames: u64,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
            frames: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Frames delivered since the scheduler was created
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start the loop. Restarts if already running; stays idle with no nodes.
    pub fn start(&mut self, host: &mut dyn FrameHost, node_count: usize) -> bool {
        if self.is_running() {
            self.stop(host);
        }
        if node_count == 0 {
            tracing::debug!("Scheduler start skipped: no nodes");
            return false;
        }
        let request = host.request_frame();
        self.state = SchedulerState::Running {
            pending: Some(request),
        };
        tracing::info!("Animation loop started ({} nodes)", node_count);
        true
    }

    /// Stop the loop and cancel any outstanding frame request.
    pub fn stop(&mut self, host: &mut dyn FrameHost) {
        if let SchedulerState::Running { pending } = self.state {
            if let Some(request) = pending {
                host.cancel_frame(request);
            }
            tracing::info!("Animation loop stopped after {} frames", self.frames);
        }
        self.state = SchedulerState::Idle;
    }

    /// Accept a delivered frame. Stale or unexpected requests yield `None`.
    pub fn begin_frame(&mut self, request: FrameRequest, time: f64) -> Option<FrameTick> {
        match self.state {
            SchedulerState::Running {
                pending: Some(pending),
            } if pending == request => {
                self.state = SchedulerState::Running { pending: None };
                self.frames += 1;
                Some(FrameTick {
                    time,
                    frame: self.frames,
                })
            }
            _ => {
                tracing::trace!("Ignoring stale frame request {:?}", request);
                None
            }
        }
    }

    /// Finish the current frame and request the next one.
    pub fn end_frame(&mut self, host: &mut dyn FrameHost) {
        if let SchedulerState::Running { pending: None } = self.state {
            self.state = SchedulerState::Running {
                pending: Some(host.request_frame()),
            };
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualHost;
    use super::*;

    fn run_frame(scheduler: &mut RenderScheduler, host: &mut ManualHost, time: f64) -> usize {
        let mut ticks = 0;
        for request in host.drain() {
            if scheduler.begin_frame(request, time).is_some() {
                ticks += 1;
                scheduler.end_frame(host);
            }
        }
        ticks
    }

    #[test]
    fn start_requires_nodes() {
        let mut host = ManualHost::default();
        let mut scheduler = RenderScheduler::new();
        assert!(!scheduler.start(&mut host, 0));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(host.outstanding.is_empty());
    }

    #[test]
    fn double_start_keeps_one_chain() {
        let mut host = ManualHost::default();
        let mut scheduler = RenderScheduler::new();
        scheduler.start(&mut host, 3);
        scheduler.start(&mut host, 3);
        assert_eq!(host.outstanding.len(), 1);
        assert_eq!(host.cancelled, 1);

        for i in 0..5 {
            assert_eq!(run_frame(&mut scheduler, &mut host, i as f64), 1);
            assert_eq!(host.outstanding.len(), 1);
        }

        scheduler.stop(&mut host);
        assert!(host.outstanding.is_empty());
        assert_eq!(run_frame(&mut scheduler, &mut host, 9.0), 0);
    }

    #[test]
    fn stale_request_after_restart_is_ignored() {
        let mut host = ManualHost::default();
        let mut scheduler = RenderScheduler::new();
        scheduler.start(&mut host, 1);
        let old = *host.outstanding.iter().next().unwrap();
        scheduler.stop(&mut host);
        scheduler.start(&mut host, 1);
        assert!(scheduler.begin_frame(old, 0.0).is_none());
        assert_eq!(scheduler.frames(), 0);
    }

    #[test]
    fn next_request_only_after_frame_work() {
        let mut host = ManualHost::default();
        let mut scheduler = RenderScheduler::new();
        scheduler.start(&mut host, 1);
        let request = host.drain().pop().unwrap();
        let tick = scheduler.begin_frame(request, 0.5).unwrap();
        assert_eq!(tick.frame, 1);
        assert!(host.outstanding.is_empty());
        assert_eq!(scheduler.state(), SchedulerState::Running { pending: None });
        scheduler.end_frame(&mut host);
        assert_eq!(host.outstanding.len(), 1);
    }

    #[test]
    fn stop_mid_frame_leaves_nothing_outstanding() {
        let mut host = ManualHost::default();
        let mut scheduler = RenderScheduler::new();
        scheduler.start(&mut host, 2);
        let request = host.drain().pop().unwrap();
        scheduler.begin_frame(request, 0.0);
        scheduler.stop(&mut host);
        scheduler.end_frame(&mut host);
        assert!(host.outstanding.is_empty());
        assert!(!scheduler.is_running());
    }
}
