mod app;
mod orgs;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{FilterParams, OrgNetworkApp};
use crate::orgs::{DEFAULT_INDEX_URL, IndexLocation, LoadOptions, SourceFilter};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// URL of the organization index JSON.
    #[arg(long, default_value = DEFAULT_INDEX_URL)]
    index_url: String,

    /// Read the index from a local file instead of fetching it.
    #[arg(long)]
    index_file: Option<PathBuf>,

    /// Initial source filter: Both, 3W or IATI.
    #[arg(long, default_value = "Both")]
    source: SourceFilter,

    /// Start with the humanitarian-only filter enabled.
    #[arg(long)]
    humanitarian_only: bool,

    /// HTTP timeout when fetching the index.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

impl Args {
    fn load_options(&self) -> LoadOptions {
        let location = match &self.index_file {
            Some(path) => IndexLocation::File(path.clone()),
            None => IndexLocation::Url(self.index_url.clone()),
        };

        LoadOptions {
            location,
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orgnet=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_logging();

    let load_options = args.load_options();
    let filters = FilterParams {
        source: args.source,
        humanitarian_only: args.humanitarian_only,
    };
    tracing::info!(location = %load_options.location, source = %filters.source, "starting orgnet");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "orgnet",
        options,
        Box::new(move |cc| {
            Ok(Box::new(OrgNetworkApp::new(
                cc,
                load_options.clone(),
                filters,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fetch_the_published_index() {
        let args = Args::try_parse_from(["orgnet"]).unwrap();
        assert_eq!(args.source, SourceFilter::Both);
        assert!(!args.humanitarian_only);
        let options = args.load_options();
        assert_eq!(
            options.location,
            IndexLocation::Url(DEFAULT_INDEX_URL.to_owned())
        );
        assert_eq!(options.timeout, Duration::from_secs(30));
    }

    #[test]
    fn index_file_overrides_url() {
        let args = Args::try_parse_from([
            "orgnet",
            "--index-file",
            "org-index.json",
            "--source",
            "iati",
            "--humanitarian-only",
        ])
        .unwrap();
        assert_eq!(
            args.load_options().location,
            IndexLocation::File(PathBuf::from("org-index.json"))
        );
        assert_eq!(args.source, SourceFilter::Only(crate::orgs::Source::Iati));
        assert!(args.humanitarian_only);
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(Args::try_parse_from(["orgnet", "--source", "HXL"]).is_err());
    }
}
