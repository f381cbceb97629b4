use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use formstate::FormState;
use log::debug;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "formstate", version, about = "Schema-driven config data utilities")]
struct Cli {
    /// JSON Schema file; derived from the data file name when omitted
    #[arg(short, long)]
    schema: Option<PathBuf>,
    /// Data file (`.toml` or `.json`)
    #[arg(short, long)]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema in effect for the data
    Resolve,
    /// Print the data with defaults filled in
    Defaults {
        /// Emit `null` for properties without a default
        #[arg(long)]
        include_undefined: bool,
    },
    /// Print the identifier tree
    Ids {
        #[arg(short, long, default_value = "root")]
        prefix: String,
    },
    /// Print the path tree
    Paths,
    /// Print the index of the oneOf/anyOf alternative the data matches
    Match {
        /// Dotted path of the polymorphic node, root when omitted
        #[arg(default_value = "")]
        path: String,
    },
    /// Validate the data against the schema
    Validate,
    /// Print top-level properties in display order
    Order {
        /// Property names, `*` for the rest
        #[arg(short, long, value_delimiter = ',')]
        order: Option<Vec<String>>,
    },
    /// Fill in defaults and optionally write them back to the data file
    Fill {
        #[arg(short, long)]
        write: bool,
    },
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut state = FormState::new(cli.data.as_ref(), cli.schema.as_ref())?;
    debug!("loaded data from {}", state.data_path.display());

    match cli.command {
        Commands::Resolve => print_json(&state.resolved_schema()?)?,
        Commands::Defaults { include_undefined } => {
            print_json(&state.defaults(include_undefined)?)?
        }
        Commands::Ids { prefix } => print_json(&state.id_schema(&prefix)?)?,
        Commands::Paths => print_json(&state.path_schema()?)?,
        Commands::Match { path } => match state.matching_option(&path)? {
            Some(index) => println!("{index}"),
            None => bail!("no oneOf/anyOf node at {path:?}"),
        },
        Commands::Validate => {
            let report = state.validate();
            if !report.is_valid() {
                for line in report.error_schema.to_error_list() {
                    eprintln!("{}", line.red());
                }
                bail!("{} validation error(s)", report.errors.len());
            }
            eprintln!("{}", "valid".green());
        }
        Commands::Order { order } => {
            print_json(&state.ordered_properties(order.as_deref())?)?
        }
        Commands::Fill { write } => {
            let changed = state.fill_defaults()?;
            if write && changed {
                state.save()?;
                eprintln!(
                    "{}",
                    format!("wrote {}", state.data_path.display()).bold().purple()
                );
            }
            print_json(&state.data)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_order_list() {
        let cli = Cli::parse_from(["formstate", "-d", "board.toml", "order", "-o", "name,*"]);
        assert_eq!(cli.data, Some(PathBuf::from("board.toml")));
        match cli.command {
            Commands::Order { order } => {
                assert_eq!(order, Some(vec!["name".to_string(), "*".to_string()]))
            }
            _ => panic!("expected order"),
        }
    }
}
