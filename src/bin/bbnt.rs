//! CLI binary for bbnt-docgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! [`GenerationConfig`] and writes the resulting documents.

use anyhow::{bail, Context, Result};
use bbnt_docgen::{
    delete_report, generate, write_document, BillingTable, DocumentId, EmbedOutcome,
    GenerationConfig, GenerationRequest, GoogleClient, ReportOutput, SlotSet, StationDirectory,
    SLOT_COUNT,
};
use clap::Parser;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate the July report with two site photos
  bbnt --station ABC123 --password pw1 --period 2024-07 \
       --image site1.jpg --image site2.jpg

  # Raw export only (no photos embedded), custom output path
  bbnt --station ABC123 --password pw1 --period 2024-07 \
       --raw -o /tmp/report.docx

  # Keep the raw variant next to the final one
  bbnt --station ABC123 --password pw1 --period 2024-07 \
       --image site1.jpg --keep-raw

  # List the billing periods available in the sheet
  bbnt --list-periods

  # Best-effort cleanup of a clone created earlier
  bbnt --delete 1AbCdEfGh...

PHOTO SLOTS:
  Up to 8 --image flags, mapped to ${Anh1} … ${Anh8} in flag order.
  A photo whose placeholder is missing from the template is appended
  at the end of the document rather than dropped.

ENVIRONMENT VARIABLES:
  GOOGLE_ACCESS_TOKEN   OAuth bearer token for Drive/Docs/Sheets
  BBNT_TEMPLATE_ID      Template document id
  BBNT_FOLDER_ID        Destination folder id
  BBNT_SPREADSHEET_ID   Spreadsheet with the CSDL and Taichinh worksheets
"#;

/// Generate station acceptance reports from spreadsheet data.
#[derive(Parser, Debug)]
#[command(
    name = "bbnt",
    version,
    about = "Generate station acceptance reports (BBNT) from spreadsheet data",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Station code (ma_tram), matched case-insensitively.
    #[arg(short, long, env = "BBNT_STATION")]
    station: Option<String>,

    /// Station password.
    #[arg(short, long, env = "BBNT_PASSWORD")]
    password: Option<String>,

    /// Billing period (Thang), e.g. 2024-07.
    #[arg(short = 'P', long, env = "BBNT_PERIOD")]
    period: Option<String>,

    /// Site photo to embed; repeatable, up to 8, mapped to ${Anh1}…${Anh8}
    /// in order.
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Write the final document to this path instead of the default name.
    #[arg(short, long, env = "BBNT_OUTPUT")]
    output: Option<PathBuf>,

    /// Skip photo embedding even when --image flags are given.
    #[arg(long)]
    raw: bool,

    /// Also write the raw (no-photos) variant next to the final document.
    #[arg(long)]
    keep_raw: bool,

    /// Template document id.
    #[arg(long, env = "BBNT_TEMPLATE_ID")]
    template: Option<String>,

    /// Destination folder id for the clone.
    #[arg(long, env = "BBNT_FOLDER_ID")]
    folder: Option<String>,

    /// Spreadsheet id holding the station and billing worksheets.
    #[arg(long, env = "BBNT_SPREADSHEET_ID")]
    spreadsheet: Option<String>,

    /// OAuth bearer token.
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// List the distinct billing periods and exit.
    #[arg(long)]
    list_periods: bool,

    /// Delete a previously created clone by id (best-effort) and exit.
    #[arg(long, value_name = "DOC_ID")]
    delete: Option<String>,

    /// HTTP timeout for remote calls in seconds.
    #[arg(long, env = "BBNT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BBNT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BBNT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let token = cli
        .token
        .clone()
        .context("no access token: set GOOGLE_ACCESS_TOKEN or pass --token")?;
    let spreadsheet = cli
        .spreadsheet
        .clone()
        .context("no spreadsheet id: set BBNT_SPREADSHEET_ID or pass --spreadsheet")?;
    let client = GoogleClient::new(token, spreadsheet, cli.api_timeout)?;

    // ── Delete mode ──────────────────────────────────────────────────────
    if let Some(ref doc_id) = cli.delete {
        delete_report(&client, &DocumentId(doc_id.clone())).await;
        if !cli.quiet {
            eprintln!("delete requested for {doc_id} (best-effort)");
        }
        return Ok(());
    }

    let config = GenerationConfig::builder(
        cli.template
            .clone()
            .context("no template id: set BBNT_TEMPLATE_ID or pass --template")?,
        cli.folder
            .clone()
            .context("no folder id: set BBNT_FOLDER_ID or pass --folder")?,
    )
    .api_timeout_secs(cli.api_timeout)
    .build()?;

    // ── List-periods mode ────────────────────────────────────────────────
    if cli.list_periods {
        let billing = BillingTable::load(&client, &config.billing_worksheet).await?;
        for period in billing.periods() {
            println!("{period}");
        }
        return Ok(());
    }

    // ── Generation ───────────────────────────────────────────────────────
    let (Some(station), Some(password), Some(period)) =
        (cli.station.clone(), cli.password.clone(), cli.period.clone())
    else {
        bail!("--station, --password and --period are required to generate a report");
    };

    if cli.images.len() > SLOT_COUNT {
        bail!(
            "at most {SLOT_COUNT} photos are supported, got {}",
            cli.images.len()
        );
    }

    let mut slots = SlotSet::new();
    if !cli.raw {
        for (index, path) in cli.images.iter().enumerate() {
            let data = std::fs::read(path)
                .with_context(|| format!("reading photo '{}'", path.display()))?;
            slots.set(index, data);
        }
    }

    let stations = StationDirectory::load(&client, &config.station_worksheet).await?;
    let billing = BillingTable::load(&client, &config.billing_worksheet).await?;

    let request = GenerationRequest {
        station_code: station,
        password,
        period,
        images: slots,
    };
    let report = generate(&request, &config, &client, &stations, &billing).await?;

    // ── Write outputs ────────────────────────────────────────────────────
    let final_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&report.file_name));
    write_document(&final_path, report.document()).await?;

    if cli.keep_raw && report.final_document.is_some() {
        let raw_path = final_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&report.raw_file_name);
        write_document(&raw_path, &report.raw_document).await?;
        if !cli.quiet {
            eprintln!("raw variant: {}", raw_path.display());
        }
    }

    if !cli.quiet {
        print_summary(&report, &final_path);
    }
    Ok(())
}

fn print_summary(report: &ReportOutput, final_path: &Path) {
    eprintln!(
        "report for {} / {} → {}",
        report.station_code,
        report.period,
        final_path.display()
    );
    eprintln!(
        "  {} substitution rules, {} photos embedded, {} appended, {}ms",
        report.stats.replacement_rules,
        report.stats.images_embedded,
        report.stats.images_appended,
        report.stats.total_duration_ms
    );
    for (i, outcome) in report.embed_outcomes.iter().enumerate() {
        match outcome {
            EmbedOutcome::Inserted(loc) => eprintln!("  photo {}: placed at {:?}", i + 1, loc),
            EmbedOutcome::Appended => {
                eprintln!("  photo {}: placeholder missing, appended at end", i + 1)
            }
        }
    }
    eprintln!(
        "  online copy: https://docs.google.com/document/d/{}/edit",
        report.document_id
    );
    eprintln!("  cleanup (optional): bbnt --delete {}", report.document_id);
}
