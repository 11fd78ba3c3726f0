//! CLI commands and argument parsing

use crate::config::Order;
use clap::{Parser, Subcommand};

/// Pagination engine for read-only HTTP data sources
#[derive(Parser, Debug)]
#[command(name = "pagereaper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog name (built-in) or YAML file
    #[arg(short, long, global = true)]
    pub catalog: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List built-in catalogs
    List,

    /// List the sources of a catalog
    Sources,

    /// Validate a catalog definition
    Validate,

    /// Read records along a traversal path
    Read {
        /// Source followed by child names, separated by '/' (e.g. page_feed/comments)
        path: String,

        /// Locator of the first source (page id, subreddit, channel, ...)
        locator: String,

        /// Maximum records to print (0 = all)
        #[arg(short = 'n', long, default_value = "0")]
        count: usize,

        /// Requested page size (0 = source maximum)
        #[arg(long, default_value = "0")]
        page_size: u32,

        /// Traversal order
        #[arg(long, default_value = "natural")]
        order: Order,

        /// Skip child branches whose requests fail
        #[arg(long)]
        skip_inner_errors: bool,

        /// Attach the parent key to child records
        #[arg(long)]
        tag_parent: bool,

        /// Pages of the first source to skip (from an earlier failed run)
        #[arg(long, default_value = "0")]
        resume_pages: usize,

        /// Credential as key=value (repeatable)
        #[arg(long = "auth", value_name = "KEY=VALUE")]
        auth: Vec<String>,

        /// Template parameter as key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from([
            "pagereaper",
            "--catalog",
            "graph",
            "read",
            "page_feed/comments",
            "1234",
            "-n",
            "50",
            "--order",
            "reverse",
            "--tag-parent",
            "--auth",
            "access_token=tok",
        ])
        .unwrap();

        assert_eq!(cli.catalog.as_deref(), Some("graph"));
        match cli.command {
            Commands::Read {
                path,
                locator,
                count,
                order,
                tag_parent,
                auth,
                ..
            } => {
                assert_eq!(path, "page_feed/comments");
                assert_eq!(locator, "1234");
                assert_eq!(count, 50);
                assert_eq!(order, Order::Reverse);
                assert!(tag_parent);
                assert_eq!(auth, vec!["access_token=tok"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_catalog_after_subcommand() {
        let cli = Cli::try_parse_from(["pagereaper", "sources", "-c", "reddit", "-v"]).unwrap();
        assert_eq!(cli.catalog.as_deref(), Some("reddit"));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Sources));
    }

    #[test]
    fn test_rejects_bad_order() {
        assert!(Cli::try_parse_from(["pagereaper", "read", "a", "b", "--order", "up"]).is_err());
    }
}
