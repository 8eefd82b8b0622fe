mod app;
#[cfg(feature = "audio")]
mod audio;
mod cli;
mod output;
mod presenter;

use anyhow::{Context, Result};
use attn_engine::{SyntheticParticipant, run_virtual_session};
use clap::Parser;
use log::info;

use crate::app::App;
use crate::cli::{Cli, Commands, SessionArgs};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { session, audio } => {
            let config = session.load_config()?;
            let records = App::new(config, audio).run().await?;
            save(&records, &session)
        }
        Commands::Simulate {
            session,
            participant,
        } => {
            let config = session.load_config()?;
            let participant = SyntheticParticipant::from(&participant);
            let records =
                run_virtual_session(config, &participant).context("running virtual session")?;

            let omitted = records.iter().filter(|r| r.omission).count();
            let correct = records.iter().filter(|r| r.is_correct == Some(true)).count();
            info!(
                "simulated {} trials: {} correct, {} omitted",
                records.len(),
                correct,
                omitted
            );
            save(&records, &session)
        }
    }
}

fn save(records: &[attn_core::TrialRecord], session: &SessionArgs) -> Result<()> {
    for path in output::write_dataset(records, &session.out_dir, session.format)? {
        println!("Saved {}", path.display());
    }
    Ok(())
}
