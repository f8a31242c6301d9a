use clap::Subcommand;

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Sessions and cycles completed so far
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set both counters back to zero
    Reset,
}

pub fn run(action: StatsAction) -> CliResult {
    let store = open_store()?;

    match action {
        StatsAction::Show { json } => {
            let counters = store.load_counters();
            if json {
                println!("{}", serde_json::to_string_pretty(&counters)?);
            } else {
                println!("Sessions today:   {}", counters.sessions_completed_today);
                println!("Cycles completed: {}", counters.cycles_completed);
            }
        }
        StatsAction::Reset => {
            store.clear_counters()?;
            println!("counters reset");
        }
    }
    Ok(())
}
