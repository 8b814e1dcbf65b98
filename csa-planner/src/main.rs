use std::process::ExitCode;

use chrono::Duration;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use csa_planner::connections::ConnectionSource;
use csa_planner::connections::linked::{
    LinkedConnectionsClient, LinkedConnectionsConfig, LinkedConnectionsSource,
};
use csa_planner::dataset::Dataset;
use csa_planner::distance::{ChangeTimeOnly, DistanceSource};
use csa_planner::domain::{Journey, StopId, Timestamp};
use csa_planner::planner::{
    JourneyRequest, JourneyResult, Planner, PlannerConfig, ScanStats, TimeBounds,
};

const USAGE: &str = "usage: csa-planner <dataset.json | --linked URL> <source> <target> <departure>

  <departure> is an RFC 3339 timestamp, e.g. 2024-03-15T08:00:00Z

environment:
  CSA_MAX_LEGS           maximum number of vehicle legs (default 5)
  CSA_DISABLE_ISD_CACHE  set to disable interstop distance caching
  RUST_LOG               log filter (default info)";

/// Change time assumed at every stop of a Linked Connections feed.
const LINKED_CHANGE_TIME_SECS: i64 = 60;

enum Timetable {
    Dataset(String),
    Linked(String),
}

struct Args {
    timetable: Timetable,
    request: JourneyRequest,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self, String> {
        let (timetable, rest) = match args {
            [flag, url, rest @ ..] if flag == "--linked" => (Timetable::Linked(url.clone()), rest),
            [path, rest @ ..] => (Timetable::Dataset(path.clone()), rest),
            [] => return Err("missing timetable".to_string()),
        };
        let [source, target, departure] = rest else {
            return Err("expected <source> <target> <departure>".to_string());
        };

        let source = StopId::parse(source).map_err(|e| e.to_string())?;
        let target = StopId::parse(target).map_err(|e| e.to_string())?;
        let departure = Timestamp::parse_rfc3339(departure).map_err(|e| e.to_string())?;

        Ok(Self {
            timetable,
            request: JourneyRequest::new(source, target, departure),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    journeys: Vec<Journey>,
    bounds: TimeBounds,
    stats: ScanStats,
}

fn config_from_env() -> PlannerConfig {
    let mut config = PlannerConfig::default();
    if let Ok(value) = std::env::var("CSA_MAX_LEGS") {
        match value.parse() {
            Ok(max_legs) => config.max_legs = max_legs,
            Err(_) => eprintln!("Warning: ignoring invalid CSA_MAX_LEGS {value:?}"),
        }
    }
    if std::env::var_os("CSA_DISABLE_ISD_CACHE").is_some() {
        config.enable_isd_cache = false;
    }
    config
}

async fn plan<C: ConnectionSource, D: DistanceSource>(
    connections: C,
    distances: D,
    config: PlannerConfig,
    request: &JourneyRequest,
) -> Result<JourneyResult, Box<dyn std::error::Error>> {
    let mut planner = Planner::new(connections, distances, config);
    let result = planner.journeys(request).await?;

    if planner.config().enable_isd_cache {
        let report = planner.cache_usage_report();
        info!(
            isd_cached = report.isd.cached,
            isd_uncached = report.isd.uncached,
            isd_for_stop_cached = report.isd_for_stop.cached,
            isd_for_stop_uncached = report.isd_for_stop.uncached,
            "ISD cache usage"
        );
    }
    Ok(result)
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_from_env();

    let result = match args.timetable {
        Timetable::Dataset(path) => {
            let dataset = Dataset::load(&path).await?;
            plan(dataset.connections, dataset.footpaths, config, &args.request).await?
        }
        Timetable::Linked(url) => {
            let client = LinkedConnectionsClient::new(LinkedConnectionsConfig::new(url))?;
            let distances = ChangeTimeOnly::new(Duration::seconds(LINKED_CHANGE_TIME_SECS));
            plan(
                LinkedConnectionsSource::new(client),
                distances,
                config,
                &args.request,
            )
            .await?
        }
    };

    let output = Output {
        journeys: result.journeys,
        bounds: result.bounds,
        stats: result.stats,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
