//! Bookkeeping of demand the compiler could not act on within a station's
//! time or capacity limits.

/// One unit of unserved work: which station fell short, where its stop sits
/// in the schedule, how much is outstanding and at what priority.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsatRecord {
    pub station: usize,
    pub schedule_index: usize,
    pub surplus: i32,
    pub priority: f64,
}

/// An insertion-ordered list of [`UnsatRecord`]s, at most one per station.
/// The first record for a station fixes its schedule index; later updates
/// either accumulate onto or overwrite the outstanding surplus.
#[derive(Debug, Clone, Default)]
pub struct UnsatLedger {
    pub records: Vec<UnsatRecord>,
}

impl UnsatLedger {
    pub fn new() -> Self {
        UnsatLedger::default()
    }

    /// Add `surplus` onto the station's outstanding quantity, refreshing its
    /// priority. A zero surplus is ignored.
    pub fn accumulate(&mut self, station: usize, index: usize, surplus: i32, priority: f64) {
        if surplus == 0 {
            return;
        }
        match self.records.iter_mut().find(|r| r.station == station) {
            Some(record) => {
                record.surplus += surplus;
                record.priority = priority;
            }
            None => self.records.push(UnsatRecord {
                station,
                schedule_index: index,
                surplus,
                priority,
            }),
        }
    }

    /// Replace the station's outstanding quantity, refreshing its priority.
    /// A zero surplus is ignored.
    pub fn overwrite(&mut self, station: usize, index: usize, surplus: i32, priority: f64) {
        if surplus == 0 {
            return;
        }
        match self.records.iter_mut().find(|r| r.station == station) {
            Some(record) => {
                record.surplus = surplus;
                record.priority = priority;
            }
            None => self.records.push(UnsatRecord {
                station,
                schedule_index: index,
                surplus,
                priority,
            }),
        }
    }

    /// Sort the records by descending priority.
    pub fn sort_priority_desc(&mut self) {
        self.records
            .sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap());
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Credit `extra` time to a station in the shared extra-time pool, merging
/// entries for the same station.
pub fn credit_extra(pool: &mut Vec<(usize, f64)>, station: usize, extra: f64) {
    if extra == 0.0 {
        return;
    }
    match pool.iter_mut().find(|(s, _)| *s == station) {
        Some((_, t)) => *t += extra,
        None => pool.push((station, extra)),
    }
}
