//! Command-line parsing.

use std::path::PathBuf;

use anyhow::{Context, bail};
use beamdrop_protocol::{ExpirationUnit, UploadOptions, types::expiration_seconds};

use crate::config::Config;

pub const USAGE: &str = "\
Usage: beamdrop [OPTIONS] <FILE>...

Options:
  --server <url>      upload server (overrides the config file)
  --password <pass>   protect the link with a password
  --expire <n>        link lifetime; without it the link is one-time
  --unit <unit>       unit for --expire: seconds, minutes, hours, days
  --attempts <n>      transfer attempts per file
  -h, --help          print this help";

/// Parsed command line. Unset flags fall back to the config file.
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    pub server: Option<String>,
    pub password: Option<String>,
    pub expire: Option<i64>,
    pub unit: Option<ExpirationUnit>,
    pub attempts: Option<u32>,
    pub files: Vec<PathBuf>,
    pub help: bool,
}

impl Args {
    /// Parses arguments, excluding the program name.
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Args::default();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--server" => parsed.server = Some(value(&mut iter, &arg)?),
                "--password" => parsed.password = Some(value(&mut iter, &arg)?),
                "--expire" => {
                    let raw = value(&mut iter, &arg)?;
                    let n = raw
                        .parse()
                        .with_context(|| format!("invalid --expire value: {raw}"))?;
                    parsed.expire = Some(n);
                }
                "--unit" => parsed.unit = Some(value(&mut iter, &arg)?.parse()?),
                "--attempts" => {
                    let raw = value(&mut iter, &arg)?;
                    let n = raw
                        .parse()
                        .with_context(|| format!("invalid --attempts value: {raw}"))?;
                    parsed.attempts = Some(n);
                }
                "--" => {
                    parsed.files.extend(iter.by_ref().map(PathBuf::from));
                }
                flag if flag.starts_with("--") => bail!("unknown option: {flag}"),
                _ => parsed.files.push(PathBuf::from(arg)),
            }
        }

        Ok(parsed)
    }

    /// Builds the per-upload access options.
    ///
    /// An explicit empty `--password` is kept so validation can reject it.
    pub fn upload_options(&self, config: &Config) -> UploadOptions {
        let mut options = UploadOptions::new();
        if let Some(password) = &self.password {
            options = options.with_password(password.clone());
        }
        if let Some(value) = self.expire {
            let unit = self.unit.unwrap_or(config.default_expiration_unit);
            options = options.with_expiration_seconds(expiration_seconds(value, unit));
        }
        options
    }

    pub fn server_url<'a>(&'a self, config: &'a Config) -> &'a str {
        self.server.as_deref().unwrap_or(&config.server_url)
    }

    pub fn max_attempts(&self, config: &Config) -> u32 {
        self.attempts.unwrap_or(config.max_attempts)
    }
}

fn value(iter: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    iter.next()
        .with_context(|| format!("{flag} requires a value"))
}
