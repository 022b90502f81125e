//! Step → events lookup for the sequencer.

use crate::generator::NoteEvent;
use crate::theory::TOTAL_STEPS;

/// For each of the 64 steps, the indices of the events starting there, in
/// their original order.
#[derive(Debug, Clone)]
pub struct StepIndex {
    steps: Vec<Vec<usize>>,
}

impl StepIndex {
    pub fn new(events: &[NoteEvent]) -> Self {
        let mut steps = vec![Vec::new(); TOTAL_STEPS as usize];
        for (i, event) in events.iter().enumerate() {
            if let Some(slot) = steps.get_mut(event.start_step as usize) {
                slot.push(i);
            }
        }
        Self { steps }
    }

    /// Indices of events starting at `step`; empty past the phrase.
    pub fn at(&self, step: u32) -> &[usize] {
        self.steps.get(step as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.steps.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
