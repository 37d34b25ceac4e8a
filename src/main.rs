use std::process::ExitCode;

use editor_probe::evidence::catalog::default_catalog;
use editor_probe::http::client::ReqwestTransport;
use editor_probe::report::Reporter;
use editor_probe::{HarnessConfig, Orchestrator};
use log::error;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = HarnessConfig::from_env();
    let reporter = Reporter::new(config.output);

    let catalog = match default_catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            error!("{err}");
            println!("Failed to build the evidence catalog: {err}");
            return ExitCode::FAILURE;
        }
    };
    let transport = match ReqwestTransport::new() {
        Ok(transport) => transport,
        Err(err) => {
            error!("{err}");
            println!("Failed to set up the HTTP transport: {err}");
            return ExitCode::FAILURE;
        }
    };

    let summary = Orchestrator::new(transport, config, catalog).run();
    reporter.summary(&summary);
    ExitCode::from(summary.exit_code())
}
