use clap::Parser;
use lane::cli::handlers;

fn main() {
    let cli = lane::cli::commands::Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
