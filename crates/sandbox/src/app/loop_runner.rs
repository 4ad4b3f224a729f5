use std::process::ExitCode;

use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::scenario::{run_hold_scenario, run_pickup_scenario, ScenarioReport};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let reports = [
        run_hold_scenario(&app.config),
        run_pickup_scenario(&app.config),
    ];

    let mut failed = false;
    for report in reports {
        match report {
            Ok(report) => failed |= !log_report(&report),
            Err(err) => {
                error!(error = %err, "scenario_setup_failed");
                failed = true;
            }
        }
    }

    if failed {
        return ExitCode::FAILURE;
    }
    info!("all_scenarios_passed");
    ExitCode::SUCCESS
}

fn log_report(report: &ScenarioReport) -> bool {
    let observed = tokens(&report.observed);
    let expected = tokens(&report.expected);
    if report.passed() {
        info!(
            scenario = report.name,
            results = %observed,
            messages = report.traffic.delivered,
            "scenario_passed"
        );
        true
    } else {
        error!(
            scenario = report.name,
            expected = %expected,
            observed = %observed,
            "scenario_mismatch"
        );
        false
    }
}

fn tokens(results: &[interaction::InteractionResult]) -> String {
    results
        .iter()
        .map(|result| result.as_token())
        .collect::<Vec<_>>()
        .join(",")
}
