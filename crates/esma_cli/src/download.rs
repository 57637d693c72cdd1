//! `esma download`: explicit files.

use esma_common::Table;

use crate::context::{build_loader, call_options};
use crate::output::print_table;
use crate::{DownloadArgs, GlobalArgs};

/// Runs `esma download`.
pub fn run(args: &DownloadArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (config, loader) = build_loader(global, None)?;
    let options = call_options(&config, &args.cache);
    let table = if args.reference {
        let mut tables = Vec::with_capacity(args.urls.len());
        for url in &args.urls {
            tables.push(loader.download_and_parse_reference_file(url, options)?);
        }
        Table::concat(tables)
    } else {
        loader.download_files(&args.urls, options)?
    };
    print_table(&table, args.format)?;
    Ok(0)
}
