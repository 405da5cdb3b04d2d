use std::env;
use std::io::{self, Read};
use std::process;

use anyhow::{bail, Context as _, Result};
use bytes::Bytes;
use log::debug;
use symbolic_regex::scan::Scanner;
use symbolic_regex::{compile, Builder, BuilderConfig, ByteSetSolver};

const DEPTH_VAR: &str = "SYMGREP_SUBSUMPTION_DEPTH";

fn config_from_env() -> Result<BuilderConfig> {
    let mut config = BuilderConfig::default();
    if let Ok(value) = env::var(DEPTH_VAR) {
        config.subsumption_depth_limit = value
            .parse()
            .with_context(|| format!("{DEPTH_VAR} must be a number, got {value:?}"))?;
    }
    Ok(config)
}

// Splits the input into lines without their terminating newline.
fn lines(mut rest: Bytes) -> impl Iterator<Item = Bytes> {
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let line = match rest.iter().position(|&b| b == b'\n') {
            Some(n) => {
                let line = rest.split_to(n);
                rest = rest.slice(1..);
                line
            }
            None => rest.split_to(rest.len()),
        };
        Some(line)
    })
}

// Prints every matching line; true if any matched.
fn run(pattern: &str, input: Bytes) -> Result<bool> {
    let mut builder = Builder::with_config(ByteSetSolver, config_from_env()?);
    let root = compile(&mut builder, pattern)
        .with_context(|| format!("invalid pattern {pattern:?}"))?;
    let mut scanner = Scanner::new(&mut builder, root);
    let mut matched = false;
    for line in lines(input) {
        if scanner.is_match(&line).context("matching failed")? {
            println!("{}", String::from_utf8_lossy(&line));
            matched = true;
        }
    }
    debug!("done, {} nodes built", builder.len());
    Ok(matched)
}

fn parse_args() -> Result<String> {
    let mut args = env::args().skip(1);
    match (args.next().as_deref(), args.next(), args.next()) {
        (Some("-E"), Some(pattern), None) => Ok(pattern),
        _ => bail!("usage: symgrep -E <pattern>"),
    }
}

fn try_main() -> Result<bool> {
    let pattern = parse_args()?;
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .context("failed to read stdin")?;
    run(&pattern, Bytes::from(input))
}

// Usage: echo <input_text> | symgrep -E <pattern>
// Exits 0 when a line matched, 1 when none did and 2 on errors.
fn main() {
    env_logger::init();

    match try_main() {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("symgrep: {err:#}");
            process::exit(2)
        }
    }
}
