use std::env;

use anyhow::{bail, Context, Result};
use deriv_match::{matches, parse, RegexStorage};

// Usage: deriv-match <regex> <text>
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("deriv-match");
        bail!("usage: {} <regex> <text>", program);
    }
    let pattern = &args[1];
    let text = &args[2];

    let storage = RegexStorage::new();
    let regex =
        parse(&storage, pattern).with_context(|| format!("error parsing regex {:?}", pattern))?;
    println!("{}", matches(&storage, regex, text));
    Ok(())
}
