use std::process;

use trip_ledger::{cli, init};

fn main() {
    init();

    if let Err(err) = cli::run_cli() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
