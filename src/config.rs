use anyhow::{anyhow, Result};

use crate::params::{Field, ParameterRecord};
use crate::state::ResolutionPolicy;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/generate-image/";
pub const DEFAULT_PLACEHOLDER: &str = "https://via.placeholder.com/400";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub endpoint: String,
    pub placeholder_url: String,
    pub policy: ResolutionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            placeholder_url: DEFAULT_PLACEHOLDER.to_string(),
            policy: ResolutionPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(Config),
    Help,
}

/// Parses the GUI's arguments, program name excluded.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut config = Config::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(Invocation::Help),
            "--endpoint" => {
                i += 1;
                config.endpoint = args.get(i).cloned().ok_or_else(|| anyhow!("missing endpoint"))?;
            }
            "--placeholder" => {
                i += 1;
                config.placeholder_url = args.get(i).cloned().ok_or_else(|| anyhow!("missing placeholder url"))?;
            }
            "--policy" => {
                i += 1;
                let raw = args.get(i).ok_or_else(|| anyhow!("missing policy"))?;
                config.policy = raw.parse().map_err(|e: String| anyhow!(e))?;
            }
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(Invocation::Run(config))
}

/// One headless request: where to send it and where to write the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliRequest {
    pub out: String,
    pub endpoint: String,
    pub record: ParameterRecord,
}

/// Parses `disk-imager-cli` arguments, program name excluded. Any
/// `--<field>` flag may spell the key with dashes or underscores.
pub fn parse_cli_args(args: &[String]) -> Result<CliRequest> {
    let mut out = None;
    let mut endpoint = DEFAULT_ENDPOINT.to_string();
    let mut record = ParameterRecord::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                i += 1;
                out = Some(args.get(i).cloned().ok_or_else(|| anyhow!("missing output path"))?);
            }
            "--endpoint" => {
                i += 1;
                endpoint = args.get(i).cloned().ok_or_else(|| anyhow!("missing endpoint"))?;
            }
            flag if flag.starts_with("--") => {
                let field: Field = flag.trim_start_matches("--").replace('-', "_").parse()?;
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("missing value for {}", flag))?;
                record = record.with_field(field, value.as_str());
            }
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
        i += 1;
    }

    let out = out.ok_or_else(|| anyhow!("--out is required"))?;
    Ok(CliRequest { out, endpoint, record })
}

pub fn usage() -> &'static str {
    "Usage: disk-imager [options]\n\
     \n\
     Options:\n\
     \x20 --endpoint <url>       Image service endpoint (default http://127.0.0.1:8000/api/generate-image/)\n\
     \x20 --placeholder <url>    Image shown before the first generate\n\
     \x20 --policy <policy>      last-resolved (default) or last-initiated\n\
     \x20 -h, --help             Show this help"
}
