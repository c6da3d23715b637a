/// A time interval relative to the source track, used to extract one segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkWindow {
    pub start: f64,
    pub duration: f64,
}

impl ChunkWindow {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Split into consecutive sub-windows of at most `max_duration` seconds.
    ///
    /// The result exactly covers this window: no gap, no overlap, last
    /// sub-window truncated to the remainder.
    pub fn subdivide(&self, max_duration: f64) -> Vec<ChunkWindow> {
        let mut windows = Vec::new();
        let mut cursor = self.start;
        let end = self.end();
        while cursor < end {
            let duration = max_duration.min(end - cursor);
            windows.push(ChunkWindow::new(cursor, duration));
            cursor += duration;
        }
        windows
    }
}
