use recurring_core::cli::{output, run_cli};

fn main() {
    if let Err(err) = run_cli() {
        output::error(format!("Error: {err}"));
        std::process::exit(1);
    }
}
