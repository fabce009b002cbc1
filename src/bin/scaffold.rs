//! `comms-mock-scaffold <module> [--bus i2c,uart,spi] [--out DIR] [--force]`
//!
//! Writes `<module>_test.rs`, a test suite skeleton for a driver module.

use std::{collections::BTreeSet, path::PathBuf, process};

use comms_mock::{
    error::HarnessError,
    logging,
    template::{parse_bus_list, BusKind, Scaffold, ScaffoldConfig},
};

const USAGE: &str = "usage: comms-mock-scaffold <module> [--bus i2c,uart,spi] [--out DIR] [--force]";

#[derive(Debug)]
struct Args {
    config: ScaffoldConfig,
    out: PathBuf,
}

fn parse_args<I: Iterator<Item = String>>(mut args: I) -> Result<Args, HarnessError> {
    let mut module = None;
    let mut buses: BTreeSet<BusKind> = BusKind::ALL.into_iter().collect();
    let mut out = PathBuf::from(".");
    let mut force = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--bus" => {
                let list = args
                    .next()
                    .ok_or_else(|| HarnessError::InvalidArgument("--bus needs a value".into()))?;
                buses = parse_bus_list(&list)?;
            }
            "--out" => {
                out = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| HarnessError::InvalidArgument("--out needs a value".into()))?;
            }
            "--force" => force = true,
            flag if flag.starts_with("--") => {
                return Err(HarnessError::InvalidArgument(format!(
                    "unknown option '{}'",
                    flag
                )))
            }
            name if module.is_none() => module = Some(name.to_string()),
            extra => {
                return Err(HarnessError::InvalidArgument(format!(
                    "unexpected argument '{}'",
                    extra
                )))
            }
        }
    }

    let module = module.ok_or_else(|| HarnessError::InvalidArgument("missing module name".into()))?;
    Ok(Args {
        config: ScaffoldConfig::new(module).buses(buses).force(force),
        out,
    })
}

fn run() -> Result<PathBuf, HarnessError> {
    let args = parse_args(std::env::args().skip(1))?;
    log::debug!("{:?}", args);
    Scaffold::new(args.config)?.write_to(&args.out)
}

fn main() {
    if let Err(e) = logging::init() {
        eprintln!("failed to set up logging: {}", e);
    }

    match run() {
        Ok(path) => println!("{}", path.display()),
        Err(e) => {
            log::error!("{}", e);
            if matches!(e, HarnessError::InvalidArgument(_)) {
                eprintln!("{}", USAGE);
            }
            process::exit(1);
        }
    }
}
