use clap::{value_parser, Arg, ArgMatches, Command};
use log::error;
use steel_fatigue::app_logic;

fn cpus() -> Arg {
    Arg::new("cpus")
        .short('c')
        .long("cpus")
        .help("Number of threads to evaluate on")
        .value_parser(value_parser!(usize))
        .default_value("1")
}

fn config() -> Arg {
    Arg::new("config")
        .help("Configuration file, YAML or TOML")
        .required(true)
}

fn cli() -> Command {
    Command::new("steel-fatigue")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fatigue post-processing of hardened steel components")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("effective-stress")
                .about("Evaluate a multiaxial effective stress criterion at every point")
                .arg(config())
                .arg(cpus()),
        )
        .subcommand(
            Command::new("weakest-link")
                .about("Evaluate failure probabilities and probabilistic S-N curves")
                .arg(config())
                .arg(cpus()),
        )
        .after_help(
            "Set RUST_LOG to control the log output, e.g. RUST_LOG=debug for per chunk details.",
        )
}

fn arguments(matches: &ArgMatches) -> (&str, usize) {
    let config = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or_default();
    let cpus = matches.get_one::<usize>("cpus").copied().unwrap_or(1);
    (config, cpus)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = match cli().get_matches().subcommand() {
        Some(("effective-stress", matches)) => {
            let (config, cpus) = arguments(matches);
            app_logic::run_effective_stress(config, cpus)
        }
        Some(("weakest-link", matches)) => {
            let (config, cpus) = arguments(matches);
            app_logic::run_weakest_link(config, cpus)
        }
        _ => unreachable!("a subcommand is required"),
    };
    if let Err(err) = result {
        error!("{:?}", err);
        std::process::exit(1);
    }
}
