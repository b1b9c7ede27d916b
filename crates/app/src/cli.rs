use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use momo_core::{Amount, TransactionType};
use momo_storage::GroupBy;
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn parse_iso_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "date must use YYYY-MM-DD format".to_string())
}

/// Accepts `1500`, `1,500` or `1500.50`; the currency suffix is optional.
pub fn parse_amount(value: &str) -> Result<Amount, String> {
    let cleaned = value
        .trim()
        .trim_end_matches(momo_core::CURRENCY)
        .trim()
        .replace(',', "");
    let decimal = Decimal::from_str(&cleaned).map_err(|_| format!("invalid amount: '{value}'"))?;
    Amount::new(decimal).ok_or_else(|| format!("amount out of range: '{value}'"))
}

pub fn parse_transaction_type(value: &str) -> Result<TransactionType, String> {
    value.parse()
}

#[derive(Debug, Parser)]
#[command(
    name = "momo",
    version,
    about = "Ingest mobile-money SMS exports and query the resulting transactions"
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse an SMS backup XML file and store new transactions
    Ingest {
        file: PathBuf,
        /// TOML rule table to classify with instead of the built-in rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// List stored transactions, oldest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },
    /// Show one transaction by id
    Show { id: Uuid },
    /// Filter transactions
    Search(SearchArgs),
    /// Totals and counts per group
    Summary {
        #[arg(long, value_enum, default_value_t = SummaryGroup::Type)]
        group_by: SummaryGroup,
    },
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Transaction type label, e.g. "Incoming Money"
    #[arg(long = "type", value_parser = parse_transaction_type)]
    pub transaction_type: Option<TransactionType>,
    /// Exact day (YYYY-MM-DD)
    #[arg(long, value_parser = parse_iso_date)]
    pub date: Option<NaiveDate>,
    /// Start date filter (YYYY-MM-DD)
    #[arg(long, value_parser = parse_iso_date)]
    pub from: Option<NaiveDate>,
    /// End date filter (YYYY-MM-DD)
    #[arg(long, value_parser = parse_iso_date)]
    pub to: Option<NaiveDate>,
    #[arg(long, value_parser = parse_amount)]
    pub amount: Option<Amount>,
    #[arg(long, value_parser = parse_amount)]
    pub min_amount: Option<Amount>,
    #[arg(long, value_parser = parse_amount)]
    pub max_amount: Option<Amount>,
    /// Free text matched against address, message, service center, type and category
    #[arg(long, short)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryGroup {
    Type,
    Month,
}

impl From<SummaryGroup> for GroupBy {
    fn from(group: SummaryGroup) -> Self {
        match group {
            SummaryGroup::Type => GroupBy::Type,
            SummaryGroup::Month => GroupBy::Month,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_flags() {
        let cli = Cli::try_parse_from([
            "momo",
            "search",
            "--type",
            "payments to code holders",
            "--from",
            "2024-05-01",
            "--min-amount",
            "1,000",
            "-q",
            "jane",
        ])
        .unwrap();
        let Commands::Search(args) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.transaction_type, Some(TransactionType::CodeHolderPayment));
        assert_eq!(args.from, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(args.min_amount, Some(Amount::from_units(1000)));
        assert_eq!(args.query.as_deref(), Some("jane"));
        assert!(args.to.is_none());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["momo", "summary", "--group-by", "month", "--config", "c.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert!(matches!(
            cli.command,
            Commands::Summary {
                group_by: SummaryGroup::Month
            }
        ));
    }

    #[test]
    fn amount_parser() {
        assert_eq!(parse_amount("2,000 RWF").unwrap(), Amount::from_units(2000));
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("lots").is_err());
    }

    #[test]
    fn rejects_bad_dates_and_types() {
        assert!(Cli::try_parse_from(["momo", "search", "--date", "10/05/2024"]).is_err());
        assert!(Cli::try_parse_from(["momo", "search", "--type", "Lottery"]).is_err());
    }
}
