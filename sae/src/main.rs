use std::{env, fs};

use anyhow::{Context, Result, bail};
use log::info;
use sweep::SweepConfig;

mod probe;

const USAGE: &str = "usage: sae <sweep-config [path] | check-sweep <path> | probe>";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["sweep-config"] => println!("{}", SweepConfig::default().to_json()?),
        ["sweep-config", path] => {
            fs::write(path, SweepConfig::default().to_json()?)
                .with_context(|| format!("cannot write '{path}'"))?;
            info!("wrote the default sweep config to {path}");
        }
        ["check-sweep", path] => {
            let config = SweepConfig::from_path(path)
                .with_context(|| format!("cannot load sweep config '{path}'"))?;
            let swept = config.swept_parameters();

            info!("sweep config '{path}' is valid, method {:?}", config.method);
            println!("{}", swept.join(", "));
        }
        ["probe"] => {
            let config = probe::ProbeConfig::from_env()?;
            info!("probing {config:?}");

            let report = probe::run(&config)?;
            println!("{report}");
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
