use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;

use crate::num::Tolerance;

#[derive(Parser, Debug, Default)]
#[command(
    name = "mapf_cuts",
    about = "Conflict cut separation for branch-and-cut-and-price MAPF.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the YAML snapshot of a fractional solution")]
    pub snapshot: Option<String>,

    #[arg(long, help = "Maximum number of cuts per separation round")]
    pub max_cuts: Option<usize>,

    #[arg(long, help = "Disable the two-edge conflict separator", default_value_t = false)]
    pub no_two_edge: bool,

    #[arg(long, help = "Disable the rectangle conflict separator", default_value_t = false)]
    pub no_rectangle: bool,

    #[arg(long, help = "Scan agent pairs in parallel", default_value_t = false)]
    pub parallel: bool,

    #[arg(
        long,
        help = "Dump fractional edges and cut contents at debug level",
        default_value_t = false
    )]
    pub debug_output: bool,

    #[arg(long, help = "Log at debug level", default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub snapshot_path: Option<String>,
    pub max_cuts_per_round: usize,
    pub two_edge: bool,
    pub rectangle: bool,
    pub parallel: bool,
    pub epsilon: f64,
    pub sum_epsilon: f64,
    pub debug_output: bool,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        let tolerance = Tolerance::default();
        Config {
            snapshot_path: None,
            max_cuts_per_round: 100,
            two_edge: true,
            rectangle: true,
            parallel: false,
            epsilon: tolerance.epsilon,
            sum_epsilon: tolerance.sum_epsilon,
            debug_output: false,
            verbose: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("cannot parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(snapshot) = &cli.snapshot {
            self.snapshot_path = Some(snapshot.clone());
        }
        if let Some(max_cuts) = cli.max_cuts {
            self.max_cuts_per_round = max_cuts;
        }
        if cli.no_two_edge {
            self.two_edge = false;
        }
        if cli.no_rectangle {
            self.rectangle = false;
        }
        self.parallel |= cli.parallel;
        self.debug_output |= cli.debug_output;
        self.verbose |= cli.verbose;

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_cuts_per_round == 0 {
            return Err(anyhow!("max_cuts_per_round must be positive"));
        }

        if !self.two_edge && !self.rectangle {
            return Err(anyhow!("at least one separator must be enabled"));
        }

        for (name, value) in [("epsilon", self.epsilon), ("sum_epsilon", self.sum_epsilon)] {
            if !(value > 0.0 && value < 0.1) {
                return Err(anyhow!("{name} must be in (0, 0.1), got {value}"));
            }
        }
        Ok(())
    }

    pub fn tolerance(&self) -> Tolerance {
        Tolerance::new(self.epsilon, self.sum_epsilon)
    }
}
