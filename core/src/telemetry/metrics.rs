/// Running totals of what the reconciler has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounters {
    snapshots: usize,
    frames: usize,
    commands: usize,
    errors: usize,
}

impl EventCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_snapshot(&mut self) {
        self.snapshots += 1;
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    pub fn record_command(&mut self) {
        self.commands += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// `(snapshots, frames, commands, errors)`
    pub fn snapshot(&self) -> (usize, usize, usize, usize) {
        (self.snapshots, self.frames, self.commands, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let mut counters = EventCounters::new();
        counters.record_snapshot();
        counters.record_snapshot();
        counters.record_error();
        assert_eq!(counters.snapshot(), (2, 0, 0, 1));
    }
}
