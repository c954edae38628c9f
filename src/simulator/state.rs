use serde::{Deserialize, Serialize};

use crate::{driver::DriverState, vehicle::VehicleState};

/// One particle: a self-contained copy of the vehicle, the hidden driver
/// state and the number of decisions taken.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub vehicle: VehicleState,
    pub driver: DriverState,
    pub decisions: u32,
}

impl State {
    pub fn new(vehicle: VehicleState, driver: DriverState) -> Self {
        Self {
            vehicle,
            driver,
            decisions: 0,
        }
    }
}
