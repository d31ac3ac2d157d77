//! Program entrypoint and argument parsing.

use std::env;
use std::fs::File;
use std::io;

use anyhow::{anyhow, Context, Result};

use siav2_update::process;

static ARG_MSG: &str = "Expected one positional argument (path to CSV file to process)";

/// Parse Arg
///
/// Parse a single positional argument, returning an error if anything other than that is present.
fn parse_arg() -> Result<String> {
	let mut args = env::args();
	if args.len() > 2 {
		return Err(anyhow!(ARG_MSG));
	}
	args.nth(1).ok_or(anyhow!(ARG_MSG))
}

fn main() -> Result<()> {
	env_logger::init();
	let filepath = parse_arg()?;
	let mut input = File::open(&filepath).with_context(|| format!("Failed to open '{}'", filepath))?;
	let stdout = io::stdout();
	let mut output = stdout.lock();
	process::run(&mut input, &mut output)
}
