fn main() {
    if let Err(err) = autobridge::cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
