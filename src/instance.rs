//! Static problem data: stations, travel times and lookup tables.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// A docking station of the network. Station 0 is the depot, modelled with
/// unbounded capacity and inventory so the truck decision rules never pick it
/// as a load or unload target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Station {
    pub id: usize,
    pub usable_bike: i32,
    pub broken_bike: i32,
    pub target_usable: i32,
    pub capacity: i32,
}

impl Station {
    pub fn new(id: usize, usable: i32, broken: i32, target: i32, capacity: i32) -> Self {
        Station {
            id,
            usable_bike: usable,
            broken_bike: broken,
            target_usable: target,
            capacity,
        }
    }

    /// The depot sentinel used at index 0 of the station table.
    pub fn depot() -> Self {
        Station::new(0, i32::MAX, 0, i32::MAX, i32::MAX)
    }
}

/// A repositioning instance, read-only after loading.
///
/// All three lookup tables are indexed `[station][usable][broken]` with a
/// placeholder entry at station 0; a table must cover every inventory state
/// up to the station capacity.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Travel time between stations, `dist[i][j]`, not assumed symmetric
    pub dist: Vec<Vec<f64>>,
    /// Per-station data, index 0 = depot
    pub stations: Vec<Station>,
    /// User dissatisfaction at a final (usable, broken) state
    pub dissat_table: Vec<Vec<Vec<f64>>>,
    /// Truck visit priority at a current (usable, broken) state
    pub priority_table: Vec<Vec<Vec<f64>>>,
    /// Repairman visit priority at a current (usable, broken) state
    pub priority_table_rpm: Vec<Vec<Vec<f64>>>,
    /// Number of stations, excluding the depot
    pub nb_clients: usize,
}

impl Instance {
    /// Assemble an instance from already-loaded parts. The depot sentinel is
    /// prepended to `stations` and a placeholder is prepended to each table.
    pub fn new(
        dist: Vec<Vec<f64>>,
        mut stations: Vec<Station>,
        mut dissat_table: Vec<Vec<Vec<f64>>>,
        mut priority_table: Vec<Vec<Vec<f64>>>,
        mut priority_table_rpm: Vec<Vec<Vec<f64>>>,
    ) -> Self {
        let nb_clients = stations.len();
        stations.insert(0, Station::depot());
        dissat_table.insert(0, Vec::new());
        priority_table.insert(0, Vec::new());
        priority_table_rpm.insert(0, Vec::new());
        Instance {
            dist,
            stations,
            dissat_table,
            priority_table,
            priority_table_rpm,
            nb_clients,
        }
    }

    /// Load an instance from a directory holding the standard file layout:
    /// `time_matrix_<n>.txt`, `station_info_<n>.txt`, `dissat_table_<i>.txt`,
    /// `BCRF_<i>.txt` and `BCRFR_<i>.txt` for each station `i`.
    ///
    /// When `broken_proportion` is non-negative the station file is expected
    /// without a broken column and the broken inventory is derived as
    /// `ceil(proportion * max(target - usable, 0))`, capped by the residual
    /// capacity.
    pub fn from_dir<P: AsRef<Path>>(
        dir: P,
        nb_clients: usize,
        broken_proportion: f64,
    ) -> io::Result<Self> {
        let dir = dir.as_ref();
        let dist = read_matrix(dir.join(format!("time_matrix_{}.txt", nb_clients)))?;
        let stations = read_station_info(
            dir.join(format!("station_info_{}.txt", nb_clients)),
            broken_proportion,
        )?;

        let mut dissat_table = Vec::with_capacity(nb_clients);
        let mut priority_table = Vec::with_capacity(nb_clients);
        let mut priority_table_rpm = Vec::with_capacity(nb_clients);
        for i in 1..=nb_clients {
            dissat_table.push(read_matrix(dir.join(format!("dissat_table_{}.txt", i)))?);
            priority_table.push(read_matrix(dir.join(format!("BCRF_{}.txt", i)))?);
            priority_table_rpm.push(read_matrix(dir.join(format!("BCRFR_{}.txt", i)))?);
        }

        Ok(Instance::new(
            dist,
            stations,
            dissat_table,
            priority_table,
            priority_table_rpm,
        ))
    }

    /// Travel time from `from` to `to`.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.dist[from][to]
    }

    /// Dissatisfaction of `station` at a final inventory state.
    pub fn dissat(&self, station: usize, usable: i32, broken: i32) -> f64 {
        self.dissat_table[station][usable as usize][broken as usize]
    }

    /// Truck visit priority of `station` at its current inventory state.
    pub fn priority(&self, station: usize, usable: i32, broken: i32) -> f64 {
        self.priority_table[station][usable as usize][broken as usize]
    }

    /// Repairman visit priority of `station` at its current inventory state.
    pub fn priority_rpm(&self, station: usize, usable: i32, broken: i32) -> f64 {
        self.priority_table_rpm[station][usable as usize][broken as usize]
    }
}

/// Mutable usable/broken counts of the whole network, indexed by station id.
///
/// One value is created per individual build, handed exclusively to each
/// compile or amendment call in turn, and cloned where the compiler needs a
/// pristine snapshot for its retry pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    pub usable: Vec<i32>,
    pub broken: Vec<i32>,
}

impl Inventory {
    /// Capture the initial network inventory of an instance.
    pub fn from_instance(instance: &Instance) -> Self {
        let n = instance.nb_clients;
        let mut usable = vec![0; n + 1];
        let mut broken = vec![0; n + 1];
        for i in 1..=n {
            usable[i] = instance.stations[i].usable_bike;
            broken[i] = instance.stations[i].broken_bike;
        }
        Inventory { usable, broken }
    }
}

fn parse_err(line: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("could not parse a number from line: {}", line),
    )
}

/// Read a whitespace-separated matrix of doubles, one row per line.
fn read_matrix<P: AsRef<Path>>(path: P) -> io::Result<Vec<Vec<f64>>> {
    let file = File::open(&path)?;
    let reader = BufReader::new(file);
    let mut matrix = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|tok| tok.parse::<f64>().map_err(|_| parse_err(&line)))
            .collect::<io::Result<Vec<f64>>>()?;
        matrix.push(row);
    }
    Ok(matrix)
}

/// Read the station table: a header line, then one row per station with
/// `id capacity usable target [broken]` columns.
fn read_station_info<P: AsRef<Path>>(path: P, broken_proportion: f64) -> io::Result<Vec<Station>> {
    let file = File::open(&path)?;
    let reader = BufReader::new(file);
    let mut stations = Vec::new();
    let mut id = 1;
    for line in reader.lines().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = line
            .split_whitespace()
            .skip(1) // the file's own id column is ignored
            .map(|tok| tok.parse::<i32>().map_err(|_| parse_err(&line)))
            .collect::<io::Result<Vec<i32>>>()?;
        let station = if broken_proportion < 0.0 {
            match fields[..] {
                [capacity, usable, target, broken] => {
                    Station::new(id, usable, broken, target, capacity)
                }
                _ => return Err(parse_err(&line)),
            }
        } else {
            match fields[..] {
                [capacity, usable, target, ..] => {
                    let broken = if usable > target {
                        0
                    } else {
                        let derived =
                            (broken_proportion * f64::from(target - usable)).ceil() as i32;
                        derived.min(capacity - usable)
                    };
                    Station::new(id, usable, broken, target, capacity)
                }
                _ => return Err(parse_err(&line)),
            }
        };
        stations.push(station);
        id += 1;
    }
    Ok(stations)
}
