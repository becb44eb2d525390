//! Route hygiene helpers and result reporting.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::config::Config;
use crate::individual::Individual;
use crate::schedule::Route;

/// Collapse consecutive duplicate stops and normalize the depot ends of each
/// route. Repairman routes additionally lose their interior depot stops
/// (a repairman never resets anything at the depot). A route reduced below
/// two stops becomes a depot-only round trip.
pub fn combine_consecutive_duplicates(routes: &mut [Route], is_rpm: bool) {
    for route in routes.iter_mut() {
        if route.len() == 2 && route[0] == 0 && route[1] == 0 {
            continue;
        }
        route.dedup();
        if route.first() != Some(&0) {
            route.insert(0, 0);
        }
        if route.last() != Some(&0) {
            route.push(0);
        }
        if is_rpm && route.len() > 2 {
            let last = route.len() - 1;
            let mut cleaned = vec![route[0]];
            cleaned.extend(route[1..last].iter().copied().filter(|&s| s != 0));
            cleaned.push(route[last]);
            *route = cleaned;
        }
        if route.len() < 2 {
            *route = vec![0, 0];
        }
    }
}

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    eval: &'a crate::evaluator::Eval,
    chrom_trk: &'a [Route],
    chrom_rpm: &'a [Route],
    truck_schedules: &'a [Vec<crate::schedule::TruckStop>],
    rpm_schedules: &'a [Vec<crate::schedule::RepairStop>],
    cpu_seconds: f64,
}

/// Write the best solution into `dir` as a text report plus a JSON twin,
/// using a collision-free numbered file name. Returns the text report path.
pub fn save_report(
    best: &Individual,
    config: &Config,
    run_time: Duration,
    dir: &Path,
    instance_no: u32,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let budget_hours = (config.time_budget / 3600.0) as i64;
    let prefix = format!(
        "{}_{}_t{}_r{}_{}h_",
        config.nb_clients, instance_no, config.nb_vehicles, config.nb_repairmen, budget_hours
    );
    let count = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(&prefix)
        })
        .count();
    let path = dir.join(format!("{}{}.txt", prefix, count + 1));

    let mut file = File::create(&path)?;
    writeln!(file, "the best solution is:")?;
    writeln!(file, "individual's fitness value: {}", best.eval.obj_val)?;
    writeln!(file, "individual's dissat value: {}", best.eval.dissat)?;
    writeln!(file, "individual's emission value: {}", best.eval.emission)?;
    writeln!(file, "individual's trkRoute: {}", best.eval.route_time_trk)?;
    writeln!(file, "individual's rpmRoute: {}", best.eval.route_time_rpm)?;
    writeln!(
        file,
        "individual's trkOperationTime: {}",
        best.eval.operation_time_trk
    )?;
    writeln!(
        file,
        "individual's rpmOperationTime: {}",
        best.eval.operation_time_rpm
    )?;

    writeln!(file, "the repositioning scheme for truck is:")?;
    for scheme in &best.truck_schedules {
        writeln!(file, "=======")?;
        for stop in scheme {
            writeln!(
                file,
                "{}\tload {} usable bikes;load {} broken bikes;unload {} usable bikes;unload {} broken bikes",
                stop.station,
                stop.load_usable,
                stop.load_broken,
                stop.unload_usable,
                stop.unload_broken
            )?;
        }
    }
    writeln!(file, "the repositioning scheme for repairman is:")?;
    for scheme in &best.rpm_schedules {
        writeln!(file, "=======")?;
        for stop in scheme {
            writeln!(file, "{}\trepair {} bikes", stop.station, stop.repaired)?;
        }
    }
    writeln!(file)?;
    writeln!(file, "CPU time: {}", run_time.as_secs_f64())?;

    writeln!(file, "dissat at each station")?;
    for (i, dissat) in best.eval.dissatisfaction.iter().enumerate() {
        writeln!(file, "dissat[{}] = {}", i + 1, dissat)?;
    }

    let summary = ReportSummary {
        eval: &best.eval,
        chrom_trk: &best.chrom_trk,
        chrom_rpm: &best.chrom_rpm,
        truck_schedules: &best.truck_schedules,
        rpm_schedules: &best.rpm_schedules,
        cpu_seconds: run_time.as_secs_f64(),
    };
    let json_path = path.with_extension("json");
    let json_file = File::create(json_path)?;
    serde_json::to_writer_pretty(json_file, &summary)?;

    Ok(path)
}
