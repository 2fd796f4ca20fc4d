use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use quote_core::{JobOptions, PdfExportOptions, SortOrder};

use crate::platform::config::ConfigOverrides;
use crate::platform::logging::LogDestination;

/// Bill-of-materials pricing dashboard for the terminal.
#[derive(Parser, Debug)]
#[command(name = "stealthquote", version)]
pub struct Cli {
    /// RON config file; defaults to ./stealthquote.ron when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// REST base URL, e.g. http://localhost:3000/api
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Live-update URL template; `{jobId}` is replaced by the job id
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Directory for downloaded exports
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum, global = true)]
    pub log: Option<LogDestination>,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            ws_url: self.ws_url.clone(),
            output_dir: self.output_dir.clone(),
            log_destination: self.log,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the input template
    Template,
    /// Create a job from a URL list (reads stdin when FILE is omitted)
    Submit {
        file: Option<PathBuf>,
        #[command(flatten)]
        options: JobOptionArgs,
        /// Keep following the job after it is created
        #[arg(long)]
        watch: bool,
    },
    /// List jobs
    Jobs {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortArg::Recency)]
        sort: SortArg,
    },
    /// Show one job with its items and summary
    Show { job: String },
    /// Follow a job's live updates until it finishes
    Watch { job: String },
    /// Retry failed items; all of them unless --item is given
    Retry {
        job: String,
        #[arg(long = "item")]
        items: Vec<String>,
    },
    /// Correct an item's name and unit price
    Edit {
        job: String,
        item: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
    },
    /// Include an item in the PDF, or exclude it with --exclude
    Include {
        job: String,
        item: String,
        #[arg(long)]
        exclude: bool,
    },
    /// Render the PDF quote and download it
    ExportPdf {
        job: String,
        #[arg(long)]
        no_appendix: bool,
        #[arg(long)]
        no_watermark: bool,
        #[arg(long)]
        audit_log: bool,
    },
    /// Download the CSV export
    ExportCsv {
        job: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Copy, PartialEq)]
pub struct JobOptionArgs {
    /// Drop repeated vendors
    #[arg(long)]
    pub vendor_dedupe: bool,
    /// Keep every vendor price instead of the lowest
    #[arg(long)]
    pub all_prices: bool,
    #[arg(long, default_value_t = 3)]
    pub concurrent_jobs: u32,
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,
    #[arg(long)]
    pub fixed_user_agent: bool,
}

impl From<JobOptionArgs> for JobOptions {
    fn from(args: JobOptionArgs) -> Self {
        JobOptions {
            vendor_dedupe: args.vendor_dedupe,
            lowest_price: !args.all_prices,
            concurrent_jobs: args.concurrent_jobs,
            delay_ms: args.delay_ms,
            user_agent_rotation: !args.fixed_user_agent,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Recency,
    Progress,
    Total,
}

impl From<SortArg> for SortOrder {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Recency => SortOrder::Recency,
            SortArg::Progress => SortOrder::Progress,
            SortArg::Total => SortOrder::Total,
        }
    }
}

pub fn pdf_options(job: &str, no_appendix: bool, no_watermark: bool, audit_log: bool) -> PdfExportOptions {
    PdfExportOptions {
        include_appendix: !no_appendix,
        watermark: !no_watermark,
        include_audit_log: audit_log,
        ..PdfExportOptions::for_job(job)
    }
}
