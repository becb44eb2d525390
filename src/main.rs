//! Command-line entry point: load an instance, run the search and write the
//! result reports.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::info;

use hgs_bsrp::config::Config;
use hgs_bsrp::instance::Instance;
use hgs_bsrp::utils::{format_duration, save_report};
use hgs_bsrp::HgsAlgorithm;

#[derive(Parser, Debug)]
#[command(
    name = "hgs_bsrp",
    about = "Hybrid genetic search for bike-share repositioning with broken-bike repair"
)]
struct Cli {
    /// Directory holding the instance directories (`<stations>_<no>/`)
    #[arg(long, default_value = "instances")]
    instance_dir: PathBuf,

    /// Number of stations
    #[arg(long, default_value_t = 10)]
    num_stations: usize,

    /// Number of trucks
    #[arg(long, default_value_t = 1)]
    num_trucks: usize,

    /// Number of repairmen
    #[arg(long, default_value_t = 1)]
    num_repairmen: usize,

    /// Instance id
    #[arg(long, default_value_t = 1)]
    instance_no: u32,

    /// Loading time per bike movement
    #[arg(long, default_value_t = 60.0)]
    loading_time: f64,

    /// Repair time per bike
    #[arg(long, default_value_t = 300.0)]
    repair_time: f64,

    /// Truck carrying capacity
    #[arg(long, default_value_t = 25)]
    vehicle_capacity: i32,

    /// Working-time budget; negative selects a default by instance size
    #[arg(long, default_value_t = -1.0, allow_hyphen_values = true)]
    time_budget: f64,

    /// Initial penalty per unit of capacity excess
    #[arg(long, default_value_t = 10.0)]
    penalty: f64,

    /// Iterations without improvement before termination
    #[arg(long, default_value_t = 5000)]
    num_non_improve: u32,

    /// Broken-bike proportion; negative reads broken counts from the file
    #[arg(long, default_value_t = -0.5, allow_hyphen_values = true)]
    broken_proportion: f64,

    /// Iterations between penalty-coefficient updates
    #[arg(long, default_value_t = 100)]
    num_penalty_management: u32,

    /// Target feasible proportion in the population
    #[arg(long, default_value_t = 0.2)]
    target_feasible: f64,

    /// Wall-clock limit in seconds; 0 disables the time check
    #[arg(long, default_value_t = 7200.0)]
    time_limit: f64,

    /// Minimum subpopulation size
    #[arg(long, default_value_t = 25)]
    mu: usize,

    /// Generation size
    #[arg(long, default_value_t = 40)]
    lambda: usize,

    /// Adaptive-repeat tolerance of the local search
    #[arg(long, default_value_t = 40)]
    it_edu: u32,

    /// Random seed; omitted seeds from entropy
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the result reports
    #[arg(long, default_value = "solutions")]
    output_dir: PathBuf,
}

/// Default working-time budget by instance size.
fn default_time_budget(num_stations: usize) -> f64 {
    if num_stations <= 15 {
        7200.0
    } else if num_stations <= 30 {
        10800.0
    } else if num_stations <= 120 {
        14400.0
    } else {
        18000.0
    }
}

fn main() -> io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let time_budget = if cli.time_budget < 0.0 {
        default_time_budget(cli.num_stations)
    } else {
        cli.time_budget
    };

    let instance_path = cli
        .instance_dir
        .join(format!("{}_{}", cli.num_stations, cli.instance_no));
    info!("loading instance from {}", instance_path.display());
    let instance = Instance::from_dir(&instance_path, cli.num_stations, cli.broken_proportion)?;

    let mut config = Config::new()
        .with_nb_clients(cli.num_stations)
        .with_nb_vehicles(cli.num_trucks)
        .with_nb_repairmen(cli.num_repairmen)
        .with_vehicle_capacity(cli.vehicle_capacity)
        .with_loading_time(cli.loading_time)
        .with_repair_time(cli.repair_time)
        .with_time_budget(time_budget)
        .with_penalty_capacity(cli.penalty)
        .with_nb_iter_no_imp(cli.num_non_improve)
        .with_nb_iter_penalty_management(cli.num_penalty_management)
        .with_target_feasible(cli.target_feasible)
        .with_mu(cli.mu)
        .with_lambda(cli.lambda)
        .with_it_edu(cli.it_edu);
    if cli.time_limit > 0.0 {
        config = config.with_time_limit(Duration::from_secs_f64(cli.time_limit));
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let mut algorithm = HgsAlgorithm::new(instance, config.clone());
    let best = algorithm.run().clone();
    let run_time = algorithm.run_time;

    println!("search finished in {}", format_duration(run_time));
    println!("best objective: {:.4}", best.eval.obj_val);
    println!("dissatisfaction: {:.4}", best.eval.dissat);
    println!("emission: {:.4}", best.eval.emission);
    println!("feasible: {}", best.eval.is_feasible);

    let report = save_report(&best, &config, run_time, &cli.output_dir, cli.instance_no)?;
    println!("report written to {}", report.display());
    Ok(())
}
