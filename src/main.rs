use std::process;

use probable_viewshed::config::AppConfig;
use probable_viewshed::{logger, Error};

fn main() {
    let app_config = match AppConfig::build(std::env::args_os()) {
        Ok(config) => config,
        Err(Error::Arguments(e)) => e.exit(),
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(2);
        }
    };

    match logger::init(app_config.log_level(), app_config.log_dir.as_deref()) {
        Ok(Some(path)) => log::debug!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    }
    log::debug!("{:#?}", app_config);

    match probable_viewshed::run(app_config) {
        Ok(summary) => log::info!(
            "{} probable viewshed maps created from {} viewshed runs",
            summary.outputs.len(),
            summary.viewshed_runs
        ),
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}
