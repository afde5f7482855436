/// CLI module - command-line interface for folio
mod cli;

fn main() {
    cli::run_cli();
}
