use anyhow::Result;
use finsight::app::App;
use finsight::config::Config;
use std::io::IsTerminal;

fn print_usage() {
    eprintln!("Usage: finsight [QUERY]");
    eprintln!();
    eprintln!("With no arguments, opens the interactive dashboard.");
    eprintln!("With a query, runs one research request and prints the report.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FINSIGHT_BASE_URL       backend address (default http://localhost:5000)");
    eprintln!("  FINSIGHT_HISTORY_LIMIT  history entries to load (default 10)");
    eprintln!("  FINSIGHT_EXPORT_HTML    write completed reports to this path");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let query = args.join(" ");
    let query = query.trim();

    let config = Config::load()?;
    config.validate()?;

    let mut app = App::new(config)?;
    if !query.is_empty() {
        app.run_headless(query).await
    } else if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        app.run().await
    } else {
        print_usage();
        anyhow::bail!("stdin is not a terminal; pass a query for one-shot mode");
    }
}
