//! `esma latest`: the most recent full transparency files.

use esma_loader::LatestFilesRequest;

use crate::context::{build_loader, call_options};
use crate::output::print_table;
use crate::{GlobalArgs, LatestArgs};

/// Builds the loader request for `args`.
fn request(args: &LatestArgs, options: esma_cache::CallOptions) -> LatestFilesRequest {
    LatestFilesRequest {
        file_type: args.file_type.clone(),
        vcap: args.vcap,
        isin: args.isin.clone(),
        cfi: args.cfi,
        equity: !args.non_equity,
        options,
    }
}

/// Runs `esma latest`.
pub fn run(args: &LatestArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, loader) = build_loader(global, Some(&args.query))?;
    let request = request(args, call_options(&config, &args.cache));
    let table = loader.load_latest_files(&request)?;
    if table.is_empty() {
        tracing::warn!("no matching files found");
    }
    print_table(&table, args.format)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cli, Command};
    use clap::Parser;
    use esma_loader::Cfi;

    #[test]
    fn request_mirrors_flags() {
        let cli = Cli::parse_from(["esma", "latest", "--vcap", "--non-equity", "--cfi", "S", "--update"]);
        let Command::Latest(args) = cli.command else {
            panic!("expected Latest command");
        };
        let options = esma_cache::CallOptions {
            update: true,
            save: false,
        };
        let request = request(&args, options);
        assert!(request.vcap);
        assert!(!request.equity);
        assert_eq!(request.cfi, Cfi::S);
        assert_eq!(request.file_type, "Full");
        assert_eq!(request.options, options);
    }
}
