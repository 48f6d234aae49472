//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use conclave_domain::Strategy;
use std::path::PathBuf;

/// Reasoning strategy as accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// One model call per thought/action step
    Iterative,
    /// Plan all steps up front, re-plan once on failure
    PlanFirst,
    /// Plan, run every step, synthesize once
    Batch,
    /// Iterative attempts with a reflection after each
    SelfCritique,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Iterative => Strategy::Iterative,
            StrategyArg::PlanFirst => Strategy::PlanFirst,
            StrategyArg::Batch => Strategy::BatchReasoning,
            StrategyArg::SelfCritique => Strategy::SelfCritique,
        }
    }
}

/// CLI arguments for conclave
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(author, version, about = "Reasoning agents with a deliberating council")]
#[command(long_about = r#"
Conclave runs reasoning agents against a tiered set of models, reviews
artifacts with a weighted council of personas, and keeps a heartbeat loop
improving scheduled jobs.

Configuration files are loaded from (in priority order):
1. CONCLAVE_* environment variables (CONCLAVE_REASONING__MAX_STEPS=5)
2. --config <path>                      Explicit config file
3. ./conclave.toml or ./.conclave.toml  Project-level config
4. ~/.config/conclave/config.toml       Global config

Example:
  conclave run "summarize the TODOs under src/"
  conclave run --strategy plan-first "build the crate and then run the tests"
  conclave swarm "audit docs/" "audit src/" --budget 2.0
  conclave deliberate patch.diff --refine
  conclave heartbeat --once
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Also write daily-rolling logs to this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one reasoning task
    Run {
        /// What the agent should accomplish
        goal: String,

        /// Strategy to try first (chosen from the goal's wording if omitted)
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,

        #[arg(long, default_value = "general")]
        scope: String,

        /// Budget ceiling in USD
        #[arg(short, long, default_value_t = conclave_domain::task::DEFAULT_TASK_BUDGET)]
        budget: f64,
    },

    /// Run several goals as pooled agents sharing one parent budget
    Swarm {
        #[arg(required = true)]
        goals: Vec<String>,

        /// Parent budget in USD
        #[arg(short, long, default_value_t = 2.0)]
        budget: f64,

        /// Share of the parent budget given to each agent (default from config)
        #[arg(short, long)]
        fraction: Option<f64>,

        #[arg(long, default_value = "swarm")]
        scope: String,
    },

    /// Put an artifact in front of the council
    Deliberate {
        /// File holding the artifact; `-` reads stdin
        file: PathBuf,

        /// Let the council revise the artifact instead of only reviewing it
        #[arg(long)]
        refine: bool,

        /// Extra context shown to every persona
        #[arg(long)]
        context: Option<String>,
    },

    /// Run the heartbeat loop over the configured jobs
    Heartbeat {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Show configuration sources and validation issues
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_strategy() {
        let cli = Cli::parse_from([
            "conclave",
            "-vv",
            "run",
            "--strategy",
            "plan-first",
            "--budget",
            "0.5",
            "build it and then test it",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                goal,
                strategy,
                budget,
                scope,
            } => {
                assert_eq!(goal, "build it and then test it");
                assert_eq!(strategy.map(Strategy::from), Some(Strategy::PlanFirst));
                assert_eq!(budget, 0.5);
                assert_eq!(scope, "general");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["conclave", "heartbeat", "--once", "--no-config", "--json"]);
        assert!(cli.no_config);
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Heartbeat { once: true }));
    }

    #[test]
    fn test_swarm_requires_goals() {
        assert!(Cli::try_parse_from(["conclave", "swarm"]).is_err());
        let cli = Cli::parse_from(["conclave", "swarm", "a", "b", "--fraction", "0.4"]);
        match cli.command {
            Command::Swarm {
                goals, fraction, ..
            } => {
                assert_eq!(goals, vec!["a", "b"]);
                assert_eq!(fraction, Some(0.4));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_strategy_arg_mapping() {
        assert_eq!(Strategy::from(StrategyArg::Batch), Strategy::BatchReasoning);
        assert_eq!(
            Strategy::from(StrategyArg::SelfCritique),
            Strategy::SelfCritique
        );
    }
}
