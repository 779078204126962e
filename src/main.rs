// src/main.rs

use hydra::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.hydra_log_level) {
        eprintln!("hydra: {err:?}");
    }

    let code = match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("hydra error: {err}");
            err.exit_code()
        }
    };
    std::process::exit(code);
}
