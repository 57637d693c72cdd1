//! `esma files` and `esma fca-files`: register file listings.

use esma_loader::Dataset;

use crate::context::build_loader;
use crate::output::print_table;
use crate::{FcaFilesArgs, FilesArgs, GlobalArgs};

/// Runs `esma files`.
pub fn run(args: &FilesArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, loader) = build_loader(global, Some(&args.query))?;
    let datasets: &[Dataset] = if args.datasets.is_empty() {
        &Dataset::ALL
    } else {
        &args.datasets
    };
    let files = loader.load_mifid_file_list(datasets)?;
    print_table(&files, args.format)?;
    Ok(0)
}

/// Runs `esma fca-files`.
pub fn run_fca(args: &FcaFilesArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, loader) = build_loader(global, Some(&args.query))?;
    let files = loader.load_fca_firds_file_list()?;
    print_table(&files, args.format)?;
    Ok(0)
}
