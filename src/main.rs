use std::io;
use anyhow::Result;
use chrono::Utc;
use log::error;
use crate::initialization::init;
use crate::worker::{build_request, run};

mod config;
mod initialization;
mod logging;
mod manager_meteomatics;
mod models;
mod worker;

fn main() -> Result<()> {
    // If initialization fails the logger may not be up yet, the error goes to stderr through main
    let (config, credentials, mgr) = init()?;

    let request = build_request(&config.query, credentials, Utc::now())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&mgr.meteomatics, &request, &mut out) {
        error!("Query failed: {}", e);
        return Err(e.into());
    }

    Ok(())
}
