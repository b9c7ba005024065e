//! tl - command-line entry point

fn main() {
    if let Err(err) = tracklink::cli::run() {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
