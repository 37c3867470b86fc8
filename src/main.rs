use clap::Parser;

use notifier::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            cli::exit_code_for(&err)
        }
    };

    std::process::exit(code);
}
