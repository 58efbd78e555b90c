// SPDX-License-Identifier: MIT
//
// Status and progress sink consumed by the engines.

/// Receives status lines and progress ticks from a running job.
///
/// Both callbacks are invoked synchronously from the job's execution
/// context, in item/page order. `progress` is monotone within a phase, the
/// total is fixed and at least 1, and the final call of a successful job
/// satisfies `current == total`. A caller that wants delivery on another
/// thread (a UI, say) marshals the calls itself.
pub trait JobMonitor {
    fn status(&mut self, message: &str);
    fn progress(&mut self, current: u64, total: u64);
}

/// Monitor that discards everything.
pub struct NullMonitor;

impl JobMonitor for NullMonitor {
    fn status(&mut self, _message: &str) {}
    fn progress(&mut self, _current: u64, _total: u64) {}
}

/// Report progress with the total clamped to at least 1, so consumers never
/// divide by zero.
pub(crate) fn report(monitor: &mut dyn JobMonitor, current: u64, total: u64) {
    monitor.progress(current, total.max(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<(u64, u64)>);

    impl JobMonitor for Recorder {
        fn status(&mut self, _message: &str) {}
        fn progress(&mut self, current: u64, total: u64) {
            self.0.push((current, total));
        }
    }

    #[test]
    fn zero_total_is_normalized_to_one() {
        let mut recorder = Recorder(Vec::new());
        report(&mut recorder, 0, 0);
        report(&mut recorder, 3, 7);
        assert_eq!(recorder.0, vec![(0, 1), (3, 7)]);
    }
}
