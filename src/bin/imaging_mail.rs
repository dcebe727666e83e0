use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};

use imaging_mail::Error;
use imaging_mail::app::{RunRequest, run};
use imaging_mail::config::{load_config, resolve_keywords, resolve_mail_root};
use imaging_mail::domain::filter::{FilterSpec, SearchMode};
use imaging_mail::logging;
use imaging_mail::processor::ProcessOptions;
use imaging_mail::store::maildir::MaildirStore;

#[derive(Parser, Debug)]
#[command(name = "imaging_mail")]
#[command(about = "Extract imaging status reports from a mail folder", long_about = None)]
struct Cli {
    /// Name of the folder to search for (case-insensitive, anywhere in the mailbox)
    folder_name: String,

    /// Only test that the folder can be found
    #[arg(long = "test_connection")]
    test_connection: bool,

    /// Only messages whose subject contains this text
    #[arg(long = "subject_filter", default_value = "")]
    subject_filter: String,

    /// Text (usually an IP prefix) the body must contain; "none" disables it
    #[arg(long = "ip_filter", default_value = "none")]
    ip_filter: String,

    #[arg(long = "search_mode", value_enum, default_value = "UNREAD")]
    search_mode: SearchMode,

    /// Start date for DATE or RANGE mode (YYYY-MM-DD)
    #[arg(long = "start_date", default_value = "none")]
    start_date: String,

    /// Last date (inclusive) for RANGE mode (YYYY-MM-DD)
    #[arg(long = "end_date", default_value = "none")]
    end_date: String,

    /// Keyword for the computer name (ignored; the name comes from the subject)
    #[arg(long = "kw_comp_name", default_value = "Computer Name:")]
    kw_comp_name: String,

    /// Keyword for the serial number [default: "Serial Number:"]
    #[arg(long = "kw_serial")]
    kw_serial: Option<String>,

    /// Keyword for the reimage time [default: "Time to reimage:"]
    #[arg(long = "kw_time")]
    kw_time: Option<String>,

    /// Keyword for failed installs [default: "items failed to install:"]
    #[arg(long = "kw_failed")]
    kw_failed: Option<String>,

    /// Root directory of the mailbox [default: ~/Maildir]
    #[arg(long = "mail_root", env = "IMAGING_MAIL_ROOT")]
    mail_root: Option<PathBuf>,

    /// Config file to use instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

fn execute(cli: Cli) -> Result<(), Error> {
    let cfg = load_config(cli.config.as_deref())?;
    debug!("Ignoring computer name keyword '{}'", cli.kw_comp_name);

    let request = RunRequest {
        folder_name: cli.folder_name,
        test_connection: cli.test_connection,
        filter: FilterSpec::from_args(
            cli.search_mode,
            &cli.start_date,
            &cli.end_date,
            &cli.subject_filter,
        )?,
        options: ProcessOptions {
            mode: cli.search_mode,
            ip_filter: ProcessOptions::ip_filter_arg(&cli.ip_filter),
            keywords: resolve_keywords(&cfg, cli.kw_serial, cli.kw_time, cli.kw_failed),
        },
    };

    let root = resolve_mail_root(cli.mail_root.as_deref(), &cfg)?;
    let store = MaildirStore::connect(root)?;

    run(&store, &request, &mut std::io::stdout())?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
