use colored::Colorize;
use std::process;

fn main() {
    if let Err(e) = dotrun::cli::run() {
        eprintln!("{} {:#}", "Error:".red().bold(), anyhow::Error::from(e));
        process::exit(1);
    }
}
