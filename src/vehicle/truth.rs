use std::{cell::RefCell, rc::Rc};

use super::VehicleState;
use crate::ports::GroundTruth;

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    vehicle: VehicleState,
    decisions: u32,
}

/// Shared snapshot of the real vehicle and its decision count.
///
/// The real environment publishes into the cell after every real step; the
/// simulator holds a clone and reads it through [`GroundTruth`] when it needs
/// privileged access. Clones share the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct TruthCell {
    inner: Rc<RefCell<Snapshot>>,
}

impl TruthCell {
    pub fn new(state: VehicleState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Snapshot {
                vehicle: state,
                decisions: 0,
            })),
        }
    }

    /// Replace the published snapshot.
    pub fn publish(&self, state: VehicleState, decisions: u32) {
        *self.inner.borrow_mut() = Snapshot {
            vehicle: state,
            decisions,
        };
    }
}

impl GroundTruth for TruthCell {
    fn read_ground_truth(&self) -> VehicleState {
        self.inner.borrow().vehicle
    }

    fn read_decisions(&self) -> u32 {
        self.inner.borrow().decisions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_observe_published_state() {
        let cell = TruthCell::default();
        let reader = cell.clone();
        cell.publish(
            VehicleState {
                to_middle: 0.7,
                ..VehicleState::default()
            },
            12,
        );
        assert_eq!(reader.read_ground_truth().to_middle, 0.7);
        assert_eq!(reader.read_decisions(), 12);
    }
}
