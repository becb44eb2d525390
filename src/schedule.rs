//! Schedule representation: the concrete per-stop actions derived from a
//! route by the compiler.

use serde::{Deserialize, Serialize};

/// An ordered station visit list. Routes always start and end at the depot
/// (station 0); trucks may revisit the depot mid-route to swap their load.
pub type Route = Vec<usize>;

/// Repairmen walk or cycle between stations, so their travel time is the
/// truck travel time scaled by this factor.
pub const RPM_TRAVEL_FACTOR: f64 = 1.68;

/// One truck stop with its loading decision and the onboard quantities when
/// the truck leaves the station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TruckStop {
    pub station: usize,
    pub load_usable: i32,
    pub load_broken: i32,
    pub unload_usable: i32,
    pub unload_broken: i32,
    pub onboard_usable: i32,
    pub onboard_broken: i32,
    pub arrival_time: f64,
}

impl TruckStop {
    pub fn at(station: usize) -> Self {
        TruckStop {
            station,
            ..TruckStop::default()
        }
    }

    /// Total number of bike movements performed at this stop.
    pub fn movements(&self) -> i32 {
        self.load_usable + self.load_broken + self.unload_usable + self.unload_broken
    }

    /// True if the stop performs no loading or unloading at all.
    pub fn is_idle(&self) -> bool {
        self.movements() == 0
    }
}

/// One repairman stop with the number of bikes repaired in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairStop {
    pub station: usize,
    pub repaired: i32,
    pub arrival_time: f64,
}

impl RepairStop {
    pub fn at(station: usize) -> Self {
        RepairStop {
            station,
            ..RepairStop::default()
        }
    }
}

/// A stop from either vehicle kind, used in the merged chronological event
/// stream of the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Truck(TruckStop),
    Repairman(RepairStop),
}

impl Action {
    pub fn station(&self) -> usize {
        match self {
            Action::Truck(stop) => stop.station,
            Action::Repairman(stop) => stop.station,
        }
    }

    pub fn arrival_time(&self) -> f64 {
        match self {
            Action::Truck(stop) => stop.arrival_time,
            Action::Repairman(stop) => stop.arrival_time,
        }
    }
}
