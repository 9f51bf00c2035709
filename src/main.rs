fn main() {
    if let Err(err) = dashflow_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
