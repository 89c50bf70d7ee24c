//! Command-line interface definitions.
//!
//! Every option can also be set through the environment variable named in
//! its help text.

use crate::http::DEFAULT_USER_AGENT;
use crate::models::DEFAULT_ARTICLE_LIMIT;
use clap::Parser;

/// Command-line arguments for a harvesting run.
///
/// # Examples
///
/// ```sh
/// # Four articles per source, snapshot in the current directory
/// news_snapshot NewsPapers.json
///
/// # Ten articles per source, snapshot in ./out, no log file
/// news_snapshot NewsPapers.json --limit 10 -o ./out --no-log-file
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Sources file (JSON, or YAML when ending in .yaml/.yml)
    pub config: String,

    /// Maximum number of articles kept per source
    #[arg(short, long, env = "ARTICLE_LIMIT", default_value_t = DEFAULT_ARTICLE_LIMIT)]
    pub limit: usize,

    /// Directory the snapshot is written to
    #[arg(short, long, env = "SNAPSHOT_OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// File that log lines are mirrored to
    #[arg(long, env = "NEWS_LOG_FILE", default_value = "newsscraper.log")]
    pub log_file: String,

    /// Log to the console only
    #[arg(long)]
    pub no_log_file: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "HTTP_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_snapshot", "NewsPapers.json"]);

        assert_eq!(cli.config, "NewsPapers.json");
        assert_eq!(cli.limit, 4);
        assert_eq!(cli.output_dir, ".");
        assert_eq!(cli.log_file, "newsscraper.log");
        assert!(!cli.no_log_file);
        assert_eq!(cli.timeout_secs, 30);
    }

    #[test]
    fn test_cli_limit_anywhere() {
        let cli = Cli::parse_from(["news_snapshot", "--limit", "10", "NewsPapers.json"]);
        assert_eq!(cli.limit, 10);
        assert_eq!(cli.config, "NewsPapers.json");
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_snapshot",
            "sources.yaml",
            "-l",
            "2",
            "-o",
            "/tmp/out",
            "--no-log-file",
        ]);

        assert_eq!(cli.limit, 2);
        assert_eq!(cli.output_dir, "/tmp/out");
        assert!(cli.no_log_file);
    }

    #[test]
    fn test_cli_requires_config() {
        assert!(Cli::try_parse_from(["news_snapshot"]).is_err());
    }
}
