//! dbmap Command-Line Client
//!
//! Imports SQLite schemas into map documents and inspects, validates and
//! lists the classes of existing maps.

mod commands;
mod formatter;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::{ClassOptions, CommandOutput, ImportOptions};
use formatter::OutputFormat;
use tracing_subscriber::EnvFilter;

/// dbmap Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "dbmap")]
#[command(version, about = "Relational-to-object schema mapping tool")]
pub struct Args {
    /// Output format
    #[arg(long, global = true, default_value = "table", value_enum)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reverse-engineer a SQLite database into a map
    Import {
        /// SQLite database file
        #[arg(long)]
        sqlite: PathBuf,

        /// Name of the new map (defaults to the database file name)
        #[arg(long)]
        map_name: Option<String>,

        /// Attached databases to read, as a LIKE pattern (defaults to main)
        #[arg(long)]
        schema_pattern: Option<String>,

        /// Tables to read, as a LIKE pattern
        #[arg(long)]
        table_pattern: Option<String>,

        /// Table types to read, e.g. TABLE or VIEW
        #[arg(long = "table-type")]
        table_types: Vec<String>,

        /// Package of the generated class names
        #[arg(long)]
        package: Option<String>,

        /// Write the map to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a map for problems
    Validate {
        map: PathBuf,

        /// Maps the map depends on
        #[arg(short, long = "dependency")]
        dependencies: Vec<PathBuf>,
    },

    /// List the entities of a map
    Show {
        map: PathBuf,

        /// Maps the map depends on
        #[arg(short, long = "dependency")]
        dependencies: Vec<PathBuf>,
    },

    /// List the classes generated for a map
    Classes {
        map: PathBuf,

        /// Maps the map depends on
        #[arg(short, long = "dependency")]
        dependencies: Vec<PathBuf>,

        /// Generate a superclass and subclass per entity
        #[arg(long)]
        pair: bool,

        /// Prefix of generated superclass names
        #[arg(long)]
        superclass_prefix: Option<String>,

        /// Package of generated superclasses
        #[arg(long)]
        super_package: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dbmap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(output) => {
            if !output.text.is_empty() {
                println!("{}", output.text);
            }
            if !output.success {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<CommandOutput, commands::CliError> {
    let formatter = formatter::create_formatter(args.format);

    match args.command {
        Command::Import {
            sqlite,
            map_name,
            schema_pattern,
            table_pattern,
            table_types,
            package,
            output,
        } => {
            let options = ImportOptions {
                sqlite,
                map_name,
                schema_pattern,
                table_pattern,
                table_types,
                package,
                output,
            };
            commands::import(&options, &*formatter)
        }
        Command::Validate { map, dependencies } => commands::validate(&map, &dependencies, &*formatter),
        Command::Show { map, dependencies } => commands::show(&map, &dependencies, &*formatter),
        Command::Classes {
            map,
            dependencies,
            pair,
            superclass_prefix,
            super_package,
        } => {
            let options = ClassOptions {
                pair,
                superclass_prefix,
                super_package,
            };
            commands::classes(&map, &dependencies, &options, &*formatter)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_import() {
        let args = Args::try_parse_from([
            "dbmap",
            "import",
            "--sqlite",
            "gallery.db",
            "--table-type",
            "TABLE",
            "--table-type",
            "VIEW",
            "-o",
            "gallery.xml",
        ])
        .unwrap();
        match args.command {
            Command::Import {
                sqlite,
                table_types,
                output,
                ..
            } => {
                assert_eq!(sqlite, PathBuf::from("gallery.db"));
                assert_eq!(table_types, vec!["TABLE", "VIEW"]);
                assert_eq!(output, Some(PathBuf::from("gallery.xml")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_format_is_global() {
        let args = Args::try_parse_from(["dbmap", "validate", "map.xml", "--format", "json"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
    }
}
