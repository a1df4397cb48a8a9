use std::fs;
use std::io::{self, Read};

use anyhow::{bail, Context};
use json_descent::{from_string_with, ParseOptions, StringEscapes};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: json-descent [--decode-escapes] [--max-depth N] [PATH]";

fn parse_args() -> anyhow::Result<(ParseOptions, Option<String>)> {
    let mut options = ParseOptions::default();
    let mut path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--decode-escapes" => {
                options = options.with_string_escapes(StringEscapes::Decode);
            }
            "--max-depth" => {
                let n = args.next().context("--max-depth needs a value")?;
                let n = n
                    .parse()
                    .with_context(|| format!("Invalid --max-depth value '{n}'"))?;
                options = options.with_max_depth(n);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ if path.is_none() && !arg.starts_with("--") => path = Some(arg),
            _ => bail!("Unexpected argument '{arg}'\n{USAGE}"),
        }
    }
    Ok((options, path))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let (options, path) = parse_args()?;
    let text = match &path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Could not read {path}"))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Could not read stdin")?;
            text
        }
    };

    let value = from_string_with(&text, &options)
        .with_context(|| format!("Could not parse {}", path.as_deref().unwrap_or("<stdin>")))?;
    let json: serde_json::Value = value.into();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
