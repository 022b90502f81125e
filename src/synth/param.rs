//! Scheduled parameter automation.
//!
//! A [`ParamTimeline`] holds a value plus a time-ordered list of set and
//! linear-ramp events, evaluated at any engine time. A ramp runs from the
//! previous event's time and value to its own.

/// One automation event. Times are engine seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParamEvent {
    Set { time: f64, value: f32 },
    Ramp { time: f64, value: f32 },
}

impl ParamEvent {
    fn time(&self) -> f64 {
        match *self {
            ParamEvent::Set { time, .. } | ParamEvent::Ramp { time, .. } => time,
        }
    }

    fn value(&self) -> f32 {
        match *self {
            ParamEvent::Set { value, .. } | ParamEvent::Ramp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParamTimeline {
    initial: f32,
    events: Vec<ParamEvent>,
}

impl ParamTimeline {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Jump to `value` at `time`.
    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::Set { time, value });
    }

    /// Ramp linearly from the preceding event to `value`, arriving at `time`.
    pub fn linear_ramp_to(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::Ramp { time, value });
    }

    /// Drop every event at or after `time`.
    pub fn cancel_scheduled(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    /// Freeze the value at `now` and ramp to `target` over `duration` seconds.
    pub fn ramp_from_current(&mut self, target: f32, now: f64, duration: f64) {
        let held = self.value_at(now);
        self.cancel_scheduled(now);
        self.set_value_at(held, now);
        self.linear_ramp_to(target, now + duration);
    }

    pub fn value_at(&self, time: f64) -> f32 {
        let next = self.events.partition_point(|e| e.time() <= time);
        let (prev_time, prev_value) = match next.checked_sub(1).map(|i| self.events[i]) {
            Some(e) => (Some(e.time()), e.value()),
            None => (None, self.initial),
        };
        match self.events.get(next) {
            Some(&ParamEvent::Ramp { time: end, value }) => match prev_time {
                Some(start) if end > start => {
                    let t = ((time - start) / (end - start)) as f32;
                    prev_value + (value - prev_value) * t
                }
                _ => prev_value,
            },
            _ => prev_value,
        }
    }

    fn insert(&mut self, event: ParamEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn holds_initial_without_events() {
        let p = ParamTimeline::new(0.3);
        assert_approx_eq!(p.value_at(0.0), 0.3);
        assert_approx_eq!(p.value_at(10.0), 0.3);
    }

    #[test]
    fn attack_decay_shape() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at(0.0, 1.0);
        p.linear_ramp_to(1.0, 1.1);
        p.linear_ramp_to(0.5, 1.3);
        assert_approx_eq!(p.value_at(0.5), 0.0);
        assert_approx_eq!(p.value_at(1.05), 0.5, 1e-5);
        assert_approx_eq!(p.value_at(1.1), 1.0);
        assert_approx_eq!(p.value_at(1.2), 0.75, 1e-5);
        assert_approx_eq!(p.value_at(5.0), 0.5);
    }

    #[test]
    fn zero_length_ramp_jumps() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at(0.0, 0.0);
        p.linear_ramp_to(1.0, 0.0);
        assert_approx_eq!(p.value_at(0.0), 1.0);
    }

    #[test]
    fn cancel_then_ramp_from_current() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at(0.0, 0.0);
        p.linear_ramp_to(1.0, 1.0);
        p.ramp_from_current(0.0, 0.5, 0.5);
        assert_approx_eq!(p.value_at(0.5), 0.5, 1e-5);
        assert_approx_eq!(p.value_at(0.75), 0.25, 1e-5);
        assert_approx_eq!(p.value_at(1.0), 0.0);
        assert_approx_eq!(p.value_at(2.0), 0.0);
    }
}
