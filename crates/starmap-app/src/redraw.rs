//! Coalescing redraw requests.
//!
//! Every path that wants a new frame goes through [`RedrawQueue::request`].
//! Requests made before the next frame collapse into one pending render, and
//! only the first of them needs to poke the window.

/// Why a render was asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedrawReason {
    Initial,
    Animation,
    Resize,
    ControlChange,
    ScenePopulated,
}

#[derive(Debug, Default)]
pub struct RedrawQueue {
    reasons: Vec<RedrawReason>,
}

impl RedrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request. Returns `true` when nothing was pending yet, meaning
    /// the caller should ask the window for a redraw.
    pub fn request(&mut self, reason: RedrawReason) -> bool {
        let first = self.reasons.is_empty();
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
        first
    }

    pub fn is_pending(&self) -> bool {
        !self.reasons.is_empty()
    }

    /// Drain the reasons accumulated since the last frame, in request order.
    pub fn take(&mut self) -> Vec<RedrawReason> {
        std::mem::take(&mut self.reasons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_asks_for_redraw() {
        let mut queue = RedrawQueue::new();
        assert!(!queue.is_pending());
        assert!(queue.request(RedrawReason::Initial));
        assert!(queue.is_pending());
    }

    #[test]
    fn test_requests_coalesce_into_one_render() {
        let mut queue = RedrawQueue::new();
        assert!(queue.request(RedrawReason::ControlChange));
        assert!(!queue.request(RedrawReason::ControlChange));
        assert!(!queue.request(RedrawReason::Resize));
        assert!(!queue.request(RedrawReason::ControlChange));

        assert_eq!(
            queue.take(),
            vec![RedrawReason::ControlChange, RedrawReason::Resize]
        );
    }

    #[test]
    fn test_take_resets_queue() {
        let mut queue = RedrawQueue::new();
        queue.request(RedrawReason::ScenePopulated);
        queue.take();
        assert!(!queue.is_pending());
        assert!(queue.take().is_empty());
        // The next frame starts fresh.
        assert!(queue.request(RedrawReason::Animation));
    }
}
