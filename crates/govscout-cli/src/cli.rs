//! CLI argument definitions for govscout.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `opportunities` | SAM.gov opportunities, one branch per NAICS code |
//! | `sbir-awards` | SBIR.gov awards, one branch per agency |
//! | `sbir-solicitations` | Open SBIR.gov solicitations, one branch per keyword |
//! | `spending` | USAspending contract awards, one branch per NAICS code |
//! | `geocode` | Census geocoder lookups |
//! | `recipient` | USAspending recipient profile by UEI |
//! | `agencies` | USAspending toptier agency list |
//! | `budget` | USAspending budgetary resources for one agency |
//! | `sweep` | Every configured plan in one run |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--config` | none | TOML ingestion config |
//! | `--format` | `json` | Output format (json, ndjson) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Exit non-zero when any fetch failed |
//!
//! Command flags override the matching config lists for that run only.
//!
//! # Examples
//!
//! ```bash
//! govscout opportunities --naics 541512 --naics 541511 --days 14
//! govscout sbir-awards --agency DOD --year 2024 --pretty
//! govscout geocode "1600 Pennsylvania Ave NW, Washington, DC 20500"
//! govscout --config govscout.toml sweep --strict
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Rate-limited ingestion of public government-contracting data.
#[derive(Debug, Parser)]
#[command(
    name = "govscout",
    author,
    version,
    about = "Government-contracting data ingestion CLI",
    long_about = "govscout pulls contract opportunities, SBIR awards and solicitations, \
USAspending awards, and Census geocodes through per-source rate limiters, \
and prints normalized JSON.\n\
\n\
Use 'govscout <command> --help' for command-specific help."
)]
pub struct Cli {
    /// TOML ingestion config. Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Exit with code 5 when any upstream call failed.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON document.
    Json,
    /// One record per line, then a summary line.
    Ndjson,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search SAM.gov contract opportunities.
    ///
    ///   govscout opportunities --naics 541512 --days 30
    Opportunities(OpportunitiesArgs),

    /// Fetch SBIR.gov awards.
    ///
    ///   govscout sbir-awards --agency DOD --agency NASA --year 2024
    SbirAwards(SbirAwardsArgs),

    /// Fetch open SBIR.gov solicitations.
    ///
    ///   govscout sbir-solicitations --keyword "machine learning"
    SbirSolicitations(SbirSolicitationsArgs),

    /// Search USAspending contract awards.
    ///
    ///   govscout spending --naics 541512 --agency "Department of Defense"
    Spending(SpendingArgs),

    /// Geocode addresses or reverse-geocode a coordinate pair.
    ///
    ///   govscout geocode "4600 Silver Hill Rd, Suitland, MD 20746"
    ///   govscout geocode --street "4600 Silver Hill Rd" --state MD
    ///   govscout geocode --lon -76.92 --lat 38.84
    Geocode(GeocodeArgs),

    /// Look up a USAspending recipient profile by UEI.
    Recipient(RecipientArgs),

    /// List USAspending toptier agencies.
    Agencies,

    /// Budgetary resources by fiscal year for one toptier agency code.
    ///
    ///   govscout budget 097
    Budget(BudgetArgs),

    /// Run every configured plan and print all normalized records.
    Sweep,
}

#[derive(Debug, Args)]
pub struct OpportunitiesArgs {
    /// NAICS code; repeat for more branches. Replaces `sam.naics_codes`.
    #[arg(long = "naics")]
    pub naics_codes: Vec<String>,

    /// Posted-date lookback window in days.
    #[arg(long)]
    pub days: Option<u32>,

    /// Procurement type code (e.g. o, k, p).
    #[arg(long)]
    pub ptype: Option<String>,

    /// Set-aside code (e.g. SBA, 8A).
    #[arg(long)]
    pub set_aside: Option<String>,

    /// Maximum notices per NAICS code.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SbirAwardsArgs {
    /// Agency abbreviation; repeat for more branches. Replaces `sbir.agencies`.
    #[arg(long = "agency")]
    pub agencies: Vec<String>,

    #[arg(long)]
    pub year: Option<i32>,

    /// Maximum awards per agency.
    #[arg(long)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SbirSolicitationsArgs {
    /// Keyword; repeat for more branches. Replaces `sbir.keywords`.
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    #[arg(long)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SpendingArgs {
    /// NAICS code; repeat for more branches. Replaces `spending.naics_codes`.
    #[arg(long = "naics")]
    pub naics_codes: Vec<String>,

    /// Awarding toptier agency name.
    #[arg(long)]
    pub agency: Option<String>,

    /// Action-date lookback window in days.
    #[arg(long)]
    pub days: Option<u32>,

    #[arg(long)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Args)]
pub struct GeocodeArgs {
    /// One-line addresses, geocoded in order.
    pub addresses: Vec<String>,

    #[arg(long, conflicts_with = "addresses")]
    pub street: Option<String>,

    #[arg(long, conflicts_with = "addresses")]
    pub city: Option<String>,

    #[arg(long, conflicts_with = "addresses")]
    pub state: Option<String>,

    #[arg(long, conflicts_with = "addresses")]
    pub zip: Option<String>,

    #[arg(long, requires = "lat", allow_negative_numbers = true, conflicts_with_all = ["addresses", "street"])]
    pub lon: Option<f64>,

    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,
}

#[derive(Debug, Args)]
pub struct RecipientArgs {
    pub uei: String,
}

#[derive(Debug, Args)]
pub struct BudgetArgs {
    /// Toptier agency code, e.g. 097 for the Department of Defense.
    pub toptier_code: String,
}
