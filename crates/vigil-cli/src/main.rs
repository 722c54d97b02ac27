//! Vigil CLI - the `vigil` scenario-runner binary.

use anyhow::Result;
use clap::Parser;

use vigil_cli::Cli;
use vigil_core::observability::init_logging;
use vigil_scenario::{run_scenario, scenarios};

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    if cli.list {
        for scenario in scenarios() {
            println!("{}", scenario.name());
        }
        return Ok(());
    }
    let env = cli.env()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let failed = runtime.block_on(async {
        let mut failed = 0usize;
        for scenario in scenarios() {
            if !cli.selected(scenario.name()) {
                continue;
            }
            let report = run_scenario(scenario.as_ref(), &env).await;
            match &report.verdict {
                Ok(()) => println!("PASS {} ({:.1?})", report.name, report.elapsed),
                Err(err) => {
                    failed += 1;
                    eprintln!("FAIL {} ({:.1?}): {err}", report.name, report.elapsed);
                }
            }
        }
        failed
    });

    if failed > 0 {
        anyhow::bail!("{failed} scenario(s) failed");
    }
    Ok(())
}
