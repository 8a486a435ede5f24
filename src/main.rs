use clap::Parser;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = snowball::api::run_http_server(port).await {
            tracing::error!(error = %e, "server error");
            std::process::exit(1);
        }
        return;
    }

    let cli = snowball::api::Cli::parse();
    match snowball::api::project_from_cli(cli) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: snowball [OPTIONS] | snowball serve [port]");
            std::process::exit(1);
        }
    }
}
