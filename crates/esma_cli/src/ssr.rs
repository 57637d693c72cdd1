//! `esma ssr`: short-selling exempted shares.

use crate::context::build_loader;
use crate::output::print_table;
use crate::{GlobalArgs, SsrArgs};

/// Runs `esma ssr`.
pub fn run(args: &SsrArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (_, loader) = build_loader(global, None)?;
    let today = if args.all {
        None
    } else {
        Some(args.date.unwrap_or_else(|| chrono::Local::now().date_naive()))
    };
    let shares = loader.load_ssr_exempted_shares(today)?;
    print_table(&shares, args.format)?;
    Ok(0)
}
