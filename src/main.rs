use std::process;

use clap::Parser;
use colored::Colorize;

use campbell_river_gtfs::campbell_river::CampbellRiverAgency;
use campbell_river_gtfs::cli::Cli;
use campbell_river_gtfs::generator::Generator;
use campbell_river_gtfs::gtfs::GtfsSchedule;
use campbell_river_gtfs::mt::{output, GeneratedSpec};
use campbell_river_gtfs::tools::service;
use campbell_river_gtfs::{logger, AgencyError, Error};

fn main() {
    let cli = Cli::parse();
    logger::init();

    if let Err(err) = run(&cli) {
        tracing::error!("{}", err);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let bytes = campbell_river_gtfs::fetch::load_archive(&cli.archive)?;
    let gtfs = GtfsSchedule::from_bytes(bytes)?;
    tracing::info!("loaded GTFS feed: {}", gtfs);

    let today = service::today_in(gtfs.agencies.timezone());
    let agency = CampbellRiverAgency::new().map_err(AgencyError::from)?;
    let spec = Generator::new(agency).run(&gtfs, today)?;

    let written = output::write_all(&spec, &cli.output_dir, &cli.file_prefix)?;
    tracing::info!("wrote {} files to {}", written.len(), cli.output_dir.display());
    print_summary(&spec);
    Ok(())
}

fn print_summary(spec: &GeneratedSpec) {
    println!(
        "{} routes, {} trips, {} stops, {} service dates",
        spec.routes.len(),
        spec.trips.len(),
        spec.stops.len(),
        spec.service_dates.len()
    );
    for route in &spec.routes {
        let color = route.color.unwrap_or(spec.agency.color);
        let headsigns = spec
            .trips_of(route.id)
            .map(|trip| trip.headsign.as_str())
            .collect::<Vec<_>>();
        println!(
            "  {} {}: {}",
            route.short_name.truecolor(color.r, color.g, color.b).bold(),
            route.long_name,
            headsigns.join(" | ")
        );
    }
}
