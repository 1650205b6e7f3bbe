fn main() {
    if let Err(err) = bug_intake_lib::run() {
        eprintln!("bug-intake: {}", err);
        std::process::exit(1);
    }
}
