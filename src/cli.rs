//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use finsight_core::companies::Category;
use finsight_core::fetch::{ATTEMPT_TIMEOUT, DEFAULT_MAX_RETRIES};
use finsight_core::filing::Quarter;
use finsight_core::ingest::{ContentPolicy, DEFAULT_CONCURRENCY};

/// Default per-domain spacing between requests.
pub(crate) const DEFAULT_RATE_LIMIT_MS: u64 = 1500;

/// Default delay before the first retry.
pub(crate) const DEFAULT_INITIAL_DELAY_MS: u64 = 500;

/// Download, validate and catalogue financial filings.
///
/// Finsight locates quarterly and annual reports for a fixed set of tracked
/// companies (SEC EDGAR first, investor-relations pages second), downloads
/// them with bounded retries and only stores files that pass validation.
#[derive(Parser, Debug)]
#[command(name = "finsight")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Locate and download filings for tracked companies
    Download(DownloadArgs),
    /// Download a single URL with retries and validate it before saving
    Fetch(FetchArgs),
    /// Validate local files and scan them for unsafe content
    Validate(ValidateArgs),
    /// List tracked companies
    Companies(CompaniesArgs),
}

/// Retry and timeout flags shared by `download` and `fetch`.
#[derive(Args, Debug, Clone)]
pub struct RetryArgs {
    /// Total attempts per request, including the first (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds; doubled on each later retry (max 60000)
    #[arg(long, default_value_t = DEFAULT_INITIAL_DELAY_MS, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub initial_delay_ms: u64,

    /// Timeout for each HTTP attempt in seconds (1-3600)
    #[arg(long, default_value_t = ATTEMPT_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Fiscal year to collect; repeat or comma-separate for several
    #[arg(short = 'y', long = "year", required = true, value_delimiter = ',', value_parser = clap::value_parser!(i32).range(1994..=2100))]
    pub years: Vec<i32>,

    /// Period to collect (Q1-Q4 or FY); all periods when omitted
    #[arg(long = "quarter", value_delimiter = ',')]
    pub quarters: Vec<Quarter>,

    /// Restrict to these tickers; repeat or comma-separate
    #[arg(short = 't', long = "ticker", value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Restrict to one company category
    #[arg(long)]
    pub category: Option<Category>,

    /// Directory for downloaded filings and the run manifest (default: ./filings)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent filings in flight (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Minimum delay between requests to the same domain in milliseconds (0 to disable, max 60000)
    #[arg(short = 'l', long, default_value_t = DEFAULT_RATE_LIMIT_MS, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub rate_limit: u64,

    /// Refuse to store documents containing script markup instead of flagging them
    #[arg(long)]
    pub reject_unsafe: bool,

    #[command(flatten)]
    pub retry: RetryArgs,
}

impl DownloadArgs {
    #[must_use]
    pub fn content_policy(&self) -> ContentPolicy {
        if self.reject_unsafe {
            ContentPolicy::Reject
        } else {
            ContentPolicy::Flag
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URL to download
    pub url: String,

    /// Destination file (default: last URL path segment in the current directory)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Overall budget for the download in seconds, retries included
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=86400))]
    pub deadline_secs: Option<u64>,

    /// Refuse to save documents containing script markup
    #[arg(long)]
    pub reject_unsafe: bool,

    #[command(flatten)]
    pub retry: RetryArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Files to check
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct CompaniesArgs {
    /// Only list companies in this category
    #[arg(long)]
    pub category: Option<Category>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use clap::error::ErrorKind;
    use finsight_core::fetch::DEFAULT_INITIAL_DELAY;

    use super::*;

    fn download(args: &[&str]) -> DownloadArgs {
        let argv = ["finsight", "download"].iter().chain(args).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Download(args) => args,
            other => panic!("expected download command, got {other:?}"),
        }
    }

    fn download_err(args: &[&str]) -> ErrorKind {
        let argv = ["finsight", "download"].iter().chain(args).copied();
        Cli::try_parse_from(argv).unwrap_err().kind()
    }

    // ==================== Global Flag Tests ====================

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["finsight"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Cli::try_parse_from(["finsight", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Cli::try_parse_from(["finsight", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Cli::try_parse_from(["finsight", "companies", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_verbose_flag_counts_on_either_side_of_subcommand() {
        let cli = Cli::try_parse_from(["finsight", "-vv", "companies"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["finsight", "companies", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let cli = Cli::try_parse_from(["finsight", "--quiet", "companies"]).unwrap();
        assert!(cli.quiet);
    }

    // ==================== Download Tests ====================

    #[test]
    fn test_download_defaults() {
        let args = download(&["--year", "2024"]);
        assert_eq!(args.years, vec![2024]);
        assert!(args.quarters.is_empty());
        assert!(args.tickers.is_empty());
        assert!(args.category.is_none());
        assert!(args.output_dir.is_none());
        assert_eq!(args.concurrency, 10);
        assert_eq!(args.rate_limit, DEFAULT_RATE_LIMIT_MS);
        assert!(!args.reject_unsafe);
        assert_eq!(args.retry.max_retries, 3);
        assert_eq!(args.retry.initial_delay_ms, 500);
        assert_eq!(args.retry.timeout_secs, 30);
        assert_eq!(args.content_policy(), ContentPolicy::Flag);
    }

    #[test]
    fn test_download_requires_year() {
        assert_eq!(download_err(&[]), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_download_year_out_of_range_rejected() {
        assert_eq!(download_err(&["-y", "1900"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_download_multiple_years_and_quarters() {
        let args = download(&["-y", "2023,2024", "--quarter", "q1", "--quarter", "FY"]);
        assert_eq!(args.years, vec![2023, 2024]);
        assert_eq!(args.quarters, vec![Quarter::Q1, Quarter::Fy]);
    }

    #[test]
    fn test_download_invalid_quarter_rejected() {
        assert_eq!(
            download_err(&["-y", "2024", "--quarter", "Q5"]),
            ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_download_tickers_and_category() {
        let args = download(&["-y", "2024", "-t", "NVDA,amd", "--category", "ai-supply-chain"]);
        assert_eq!(args.tickers, vec!["NVDA", "amd"]);
        assert_eq!(args.category, Some(Category::AiSupplyChain));
    }

    #[test]
    fn test_download_concurrency_bounds() {
        assert_eq!(download(&["-y", "2024", "-c", "1"]).concurrency, 1);
        assert_eq!(download(&["-y", "2024", "-c", "100"]).concurrency, 100);
        assert_eq!(download_err(&["-y", "2024", "-c", "0"]), ErrorKind::ValueValidation);
        assert_eq!(download_err(&["-y", "2024", "-c", "101"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_download_max_retries_bounds() {
        assert_eq!(download(&["-y", "2024", "-r", "1"]).retry.max_retries, 1);
        assert_eq!(download(&["-y", "2024", "--max-retries", "10"]).retry.max_retries, 10);
        assert_eq!(download_err(&["-y", "2024", "-r", "0"]), ErrorKind::ValueValidation);
        assert_eq!(download_err(&["-y", "2024", "-r", "11"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_download_rate_limit_bounds() {
        assert_eq!(download(&["-y", "2024", "-l", "0"]).rate_limit, 0);
        assert_eq!(download(&["-y", "2024", "--rate-limit", "60000"]).rate_limit, 60000);
        assert_eq!(download_err(&["-y", "2024", "-l", "60001"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_download_reject_unsafe_sets_policy() {
        let args = download(&["-y", "2024", "--reject-unsafe"]);
        assert_eq!(args.content_policy(), ContentPolicy::Reject);
    }

    #[test]
    fn test_download_output_dir() {
        let args = download(&["-y", "2024", "-o", "/tmp/filings"]);
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/filings")));
    }

    // ==================== Other Subcommand Tests ====================

    #[test]
    fn test_fetch_args() {
        let cli = Cli::try_parse_from([
            "finsight",
            "fetch",
            "https://example.com/q1.pdf",
            "-o",
            "q1.pdf",
            "--deadline-secs",
            "60",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert_eq!(args.url, "https://example.com/q1.pdf");
        assert_eq!(args.output, Some(PathBuf::from("q1.pdf")));
        assert_eq!(args.deadline_secs, Some(60));
        assert_eq!(args.retry.timeout_secs, 5);
    }

    #[test]
    fn test_validate_requires_files() {
        let err = Cli::try_parse_from(["finsight", "validate"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["finsight", "validate", "a.pdf", "b.docx"]).unwrap();
        let Command::Validate(args) = cli.command else {
            panic!("expected validate command");
        };
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn test_companies_category_filter() {
        let cli = Cli::try_parse_from(["finsight", "companies", "--category", "ai_applications"])
            .unwrap();
        let Command::Companies(args) = cli.command else {
            panic!("expected companies command");
        };
        assert_eq!(args.category, Some(Category::AiApplications));
        assert!(!args.json);
    }

    #[test]
    fn test_default_initial_delay_matches_library() {
        assert_eq!(
            Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            DEFAULT_INITIAL_DELAY
        );
    }
}
