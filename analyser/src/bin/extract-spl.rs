//! Collect SPL readings from every matching SNMP trap log into one CSV, sorted by timestamp.

use env_logger::Env;
use spl_analyser::{extract, Args};

fn main() -> Result<(), spl_analyser::Error> {
    let argv = std::env::args_os().map(|arg| arg.to_string_lossy().into_owned());

    let (args, ignored) = Args::parse_lenient(argv);

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    for arg in ignored {
        println!("Ignoring unknown argument: {}", arg);
    }

    let settings = args.into_settings();

    let count = extract::run(&settings)?;

    println!(
        "Done. {} rows extracted -> {}",
        count,
        settings.out.display()
    );

    Ok(())
}
