use smallvec::SmallVec;

use crate::constants::{Duration, UserDuration, scale_duration};

/// Closed interval of internal (scaled) time points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Duration,
    pub end: Duration,
}

impl TimeWindow {
    pub fn new(start: Duration, end: Duration) -> Self {
        TimeWindow { start, end }
    }

    pub fn from_user(start: UserDuration, end: UserDuration) -> Self {
        TimeWindow {
            start: scale_duration(start),
            end: scale_duration(end),
        }
    }

    /// The whole representable horizon, used when no window is given.
    pub fn full() -> Self {
        TimeWindow {
            start: 0,
            end: scale_duration(UserDuration::MAX),
        }
    }

    pub fn contains(&self, t: Duration) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::full()
    }
}

/// Nonempty sorted list of time windows.
#[derive(Clone, Debug)]
pub struct TimeWindows(SmallVec<[TimeWindow; 1]>);

impl TimeWindows {
    pub fn new(mut windows: Vec<TimeWindow>) -> Self {
        assert!(!windows.is_empty(), "time window list must be nonempty");
        windows.sort_by_key(|tw| (tw.start, tw.end));
        TimeWindows(SmallVec::from_vec(windows))
    }

    pub fn full() -> Self {
        TimeWindows(smallvec::smallvec![TimeWindow::full()])
    }

    pub fn windows(&self) -> &[TimeWindow] {
        &self.0
    }

    /// Earliest feasible service start for a task ready at `ready`: the
    /// first window that has not closed yet, waiting for its opening when
    /// needed. `None` means every window has closed.
    pub fn earliest_start(&self, ready: Duration) -> Option<Duration> {
        self.0
            .iter()
            .find(|tw| ready <= tw.end)
            .map(|tw| ready.max(tw.start))
    }

    /// Latest feasible service start not later than `bound`. `None` means
    /// every window opens after `bound`.
    pub fn latest_start(&self, bound: Duration) -> Option<Duration> {
        self.0
            .iter()
            .rev()
            .find(|tw| tw.start <= bound)
            .map(|tw| bound.min(tw.end))
    }

    pub fn is_satisfied(&self, t: Duration) -> bool {
        self.0.iter().any(|tw| tw.contains(t))
    }

    /// Latest closing time across windows, the task's deadline.
    pub fn deadline(&self) -> Duration {
        self.0.iter().map(|tw| tw.end).max().unwrap()
    }

    /// Narrows every window to `[after, before]`, dropping the ones that
    /// become empty. Used when a pinned step carries forced service bounds.
    /// `None` means no window survives.
    pub fn narrowed(&self, after: Duration, before: Duration) -> Option<TimeWindows> {
        let narrowed: Vec<TimeWindow> = self
            .0
            .iter()
            .filter_map(|tw| {
                let start = tw.start.max(after);
                let end = tw.end.min(before);
                (start <= end).then_some(TimeWindow::new(start, end))
            })
            .collect();

        if narrowed.is_empty() {
            None
        } else {
            Some(TimeWindows::new(narrowed))
        }
    }
}

impl Default for TimeWindows {
    fn default() -> Self {
        TimeWindows::full()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(raw: &[(u32, u32)]) -> TimeWindows {
        TimeWindows::new(
            raw.iter()
                .map(|&(s, e)| TimeWindow::from_user(s, e))
                .collect(),
        )
    }

    #[test]
    fn test_earliest_start_waits_for_opening() {
        let tws = windows(&[(100, 200), (300, 400)]);
        assert_eq!(tws.earliest_start(0), Some(scale_duration(100)));
        assert_eq!(tws.earliest_start(scale_duration(150)), Some(scale_duration(150)));
        assert_eq!(tws.earliest_start(scale_duration(250)), Some(scale_duration(300)));
        assert_eq!(tws.earliest_start(scale_duration(401)), None);
    }

    #[test]
    fn test_latest_start() {
        let tws = windows(&[(100, 200), (300, 400)]);
        assert_eq!(tws.latest_start(scale_duration(500)), Some(scale_duration(400)));
        assert_eq!(tws.latest_start(scale_duration(350)), Some(scale_duration(350)));
        assert_eq!(tws.latest_start(scale_duration(250)), Some(scale_duration(200)));
        assert_eq!(tws.latest_start(scale_duration(50)), None);
    }

    #[test]
    fn test_narrowed() {
        let tws = windows(&[(100, 200), (300, 400)]);
        let narrowed = tws
            .narrowed(scale_duration(150), scale_duration(320))
            .unwrap();
        assert_eq!(
            narrowed.windows(),
            &[
                TimeWindow::from_user(150, 200),
                TimeWindow::from_user(300, 320)
            ]
        );
        assert!(tws.narrowed(scale_duration(201), scale_duration(299)).is_none());
    }
}
