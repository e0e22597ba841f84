use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::process;

use calpal_core::{CalPalService, LoadState};

pub(crate) fn cmd_data_switch(svc: &mut CalPalService, path: &Path, json: bool) -> Result<()> {
    let result = svc.switch_active_file(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.accepted {
        println!("{}", result.message);
        if let LoadState::Degraded { reason } = svc.state() {
            eprintln!("Warning: {reason}; using the default catalog");
        }
    } else {
        eprintln!("{}", result.message);
    }

    if !result.accepted {
        process::exit(if path.exists() { 1 } else { 2 });
    }

    Ok(())
}

pub(crate) fn cmd_data_show(svc: &CalPalService) -> Result<()> {
    println!("{}", svc.export_snapshot_as_text()?);
    Ok(())
}

pub(crate) fn cmd_data_status(svc: &CalPalService, json: bool) -> Result<()> {
    #[derive(Serialize)]
    struct Status<'a> {
        path: &'a Path,
        #[serde(flatten)]
        state: &'a LoadState,
        uoms: usize,
        conversions: usize,
        foods: usize,
    }

    let status = Status {
        path: svc.active_path(),
        state: svc.state(),
        uoms: svc.list_uoms().len(),
        conversions: svc.list_conversions().len(),
        foods: svc.list_foods().len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Data file:   {}", status.path.display());
    match status.state {
        LoadState::Ok => println!("State:       ok"),
        LoadState::Unloaded => println!("State:       not loaded"),
        LoadState::Degraded { reason } => {
            println!("State:       degraded (default catalog in use)");
            println!("Reason:      {reason}");
        }
    }
    println!("UOMs:        {}", status.uoms);
    println!("Conversions: {}", status.conversions);
    println!("Foods:       {}", status.foods);

    Ok(())
}
