fn main() {
    if let Err(e) = charcard::cli::main() {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}
