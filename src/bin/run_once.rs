//! One-shot runner: executes the pipeline once and prints the run log and the
//! produced narrative. Exit code 1 when the run failed.

use clap::Parser;

use cycling_news_agent::{config::AgentConfig, init_tracing, Agent};

#[derive(Debug, Parser)]
#[command(name = "run_once", about = "Run the cycling news pipeline once")]
struct Args {
    /// How many days of news to include.
    #[arg(long, env = "DAYS_BACK", default_value_t = 2)]
    days_back: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let args = Args::parse();

    let cfg = AgentConfig::from_env()?;
    let agent = Agent::from_config(&cfg);

    println!("--- START DIRECTE TEST ({} dagen terug) ---", args.days_back);
    let result = agent.run(args.days_back).await;

    println!("\n--- LOGS ---");
    for line in result.logs.messages() {
        println!("{line}");
    }

    println!("\n--- OUTPUT ---");
    println!("{}", result.content);

    if result.success {
        println!("\n✅ Test succesvol afgerond.");
        Ok(())
    } else {
        println!("\n❌ Test mislukt.");
        std::process::exit(1);
    }
}
