//! Pure viewer-state core: viewport transforms and fetch sequencing.
//!
//! The bundled browser script applies these same transforms against the DOM;
//! keeping the math here makes the clamping and anchoring rules testable
//! without a browser. Scroll offsets are always clamped to the content
//! bounds and zoom to [`Viewport::MIN_ZOOM`, `Viewport::MAX_ZOOM`].

use crate::events::ViewerEvent;

/// Scroll and zoom state of the tree view.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub zoom: f64,
    content_width: f64,
    content_height: f64,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 0.1;
    pub const MAX_ZOOM: f64 = 2.0;
    /// Fraction of the content size the scroll is nudged per unit of zoom
    /// delta, so zooming stays anchored near the viewport center.
    const ZOOM_ANCHOR_SCALE: f64 = 0.15;

    pub fn new(content_width: f64, content_height: f64) -> Self {
        Viewport {
            scroll_x: 0.0,
            scroll_y: 0.0,
            zoom: 1.0,
            content_width,
            content_height,
        }
    }

    /// Scroll to an absolute position, clamped to the content bounds.
    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.scroll_x = x.clamp(0.0, self.content_width);
        self.scroll_y = y.clamp(0.0, self.content_height);
    }

    /// Apply one pointer-drag delta: dragging right pans the content right,
    /// which moves the scroll offset left.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.set_scroll(self.scroll_x - dx, self.scroll_y - dy);
    }

    /// Apply one wheel step. The zoom factor moves opposite the wheel delta
    /// and is clamped; the scroll offset is then nudged proportionally to
    /// the zoom delta so the zoom appears anchored, not top-left pinned.
    pub fn wheel_zoom(&mut self, delta_y: f64) {
        let initial = self.zoom;
        self.zoom = (initial - delta_y / 1000.0).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);

        let scale = (self.zoom - initial) * Self::ZOOM_ANCHOR_SCALE;
        self.set_scroll(
            self.scroll_x + self.content_width * scale,
            self.scroll_y + self.content_height * scale,
        );
    }

    /// Update the content bounds after a re-render, re-clamping the current
    /// scroll so restoring it never jumps outside the new tree.
    pub fn set_content_size(&mut self, width: f64, height: f64) {
        self.content_width = width;
        self.content_height = height;
        self.set_scroll(self.scroll_x, self.scroll_y);
    }
}

/// Fetch lifecycle of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching { seq: u64 },
    Displaying,
    Error,
}

/// Selection and fetch state machine.
///
/// Every fetch carries a monotonically increasing sequence number; a
/// response is accepted only if it matches the latest issued, so a stale
/// in-flight response can never overwrite a newer one.
#[derive(Debug)]
pub struct Controller {
    pub file: String,
    pub rule: String,
    state: FetchState,
    next_seq: u64,
}

impl Controller {
    pub fn new(file: impl Into<String>, rule: impl Into<String>) -> Self {
        Controller {
            file: file.into(),
            rule: rule.into(),
            state: FetchState::Idle,
            next_seq: 0,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    /// Start a fetch, superseding any in-flight one. Returns the sequence
    /// number the eventual response must present.
    pub fn begin_fetch(&mut self) -> u64 {
        self.next_seq += 1;
        self.state = FetchState::Fetching {
            seq: self.next_seq,
        };
        self.next_seq
    }

    /// Accept a successful response. Stale responses are discarded and the
    /// current state is left untouched.
    pub fn complete(&mut self, seq: u64) -> bool {
        if self.state == (FetchState::Fetching { seq }) {
            self.state = FetchState::Displaying;
            true
        } else {
            false
        }
    }

    /// Record a failed fetch. The last displayed tree stays on screen; the
    /// failure only surfaces through logging.
    pub fn fail(&mut self, seq: u64) -> bool {
        if self.state == (FetchState::Fetching { seq }) {
            self.state = FetchState::Error;
            true
        } else {
            false
        }
    }

    /// Whether a pushed event should trigger a re-fetch for the current
    /// selection. `reload` is handled by reloading the page, not here.
    pub fn wants_refetch(&self, event: &ViewerEvent) -> bool {
        match event {
            ViewerEvent::Reload => false,
            ViewerEvent::ProgramMod => true,
            ViewerEvent::FileMod(path) => *path == self.file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_clamps_at_bounds() {
        let mut view = Viewport::new(1000.0, 800.0);
        view.wheel_zoom(5000.0);
        assert_eq!(view.zoom, Viewport::MIN_ZOOM);
        view.wheel_zoom(-50_000.0);
        assert_eq!(view.zoom, Viewport::MAX_ZOOM);
    }

    #[test]
    fn test_zoom_nudges_scroll_toward_anchor() {
        let mut view = Viewport::new(1000.0, 800.0);
        view.set_scroll(500.0, 400.0);
        view.wheel_zoom(-100.0); // zoom 1.0 -> 1.1
        assert!((view.scroll_x - 515.0).abs() < 1e-9);
        assert!((view.scroll_y - 412.0).abs() < 1e-9);
    }

    #[test]
    fn test_scroll_never_leaves_content_bounds() {
        let mut view = Viewport::new(1000.0, 800.0);
        view.set_scroll(-50.0, 900.0);
        assert_eq!((view.scroll_x, view.scroll_y), (0.0, 800.0));

        view.pan(2000.0, 2000.0);
        assert_eq!((view.scroll_x, view.scroll_y), (0.0, 0.0));
    }

    #[test]
    fn test_pan_moves_opposite_the_drag() {
        let mut view = Viewport::new(1000.0, 800.0);
        view.set_scroll(500.0, 400.0);
        view.pan(20.0, -30.0);
        assert_eq!((view.scroll_x, view.scroll_y), (480.0, 430.0));
    }

    #[test]
    fn test_shrinking_content_reclamps_scroll() {
        let mut view = Viewport::new(1000.0, 800.0);
        view.set_scroll(1000.0, 800.0);
        view.set_content_size(300.0, 200.0);
        assert_eq!((view.scroll_x, view.scroll_y), (300.0, 200.0));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut controller = Controller::new("main.dt", "entry");
        let first = controller.begin_fetch();
        let second = controller.begin_fetch();

        assert!(!controller.complete(first));
        assert_eq!(controller.state(), FetchState::Fetching { seq: second });
        assert!(controller.complete(second));
        assert_eq!(controller.state(), FetchState::Displaying);
    }

    #[test]
    fn test_failure_only_applies_to_latest_fetch() {
        let mut controller = Controller::new("main.dt", "entry");
        let first = controller.begin_fetch();
        let second = controller.begin_fetch();

        assert!(!controller.fail(first));
        assert!(controller.fail(second));
        assert_eq!(controller.state(), FetchState::Error);
    }

    #[test]
    fn test_event_relevance() {
        let controller = Controller::new("main.dt", "entry");
        assert!(controller.wants_refetch(&ViewerEvent::ProgramMod));
        assert!(controller.wants_refetch(&ViewerEvent::FileMod("main.dt".into())));
        assert!(!controller.wants_refetch(&ViewerEvent::FileMod("other.dt".into())));
        assert!(!controller.wants_refetch(&ViewerEvent::Reload));
    }
}
