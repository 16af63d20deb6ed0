use std::env;

use anyhow::Result;

use disk_imager::client::{inspect_image, ImageClient};
use disk_imager::config::{parse_cli_args, CliRequest, DEFAULT_ENDPOINT};
use disk_imager::params::Field;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() == 1 || args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    let CliRequest { out, endpoint, record } = parse_cli_args(&args[1..])?;
    let payload = record.to_payload()?;
    log::debug!("payload: {}", serde_json::to_string(&payload)?);

    let client = ImageClient::new(endpoint);
    let bytes = client.generate(&payload).await?;
    std::fs::write(&out, &bytes)?;

    match inspect_image(&bytes) {
        Some(info) => println!("Wrote {} ({}x{}, {:?})", out, info.width, info.height, info.format),
        None => println!("Wrote {} ({} bytes, not a recognised image)", out, bytes.len()),
    }
    Ok(())
}

fn print_usage() {
    println!("Disk Imager CLI");
    println!("Usage: disk-imager-cli --out image.png [options]");
    println!("Options:");
    println!("  --out <path>           Where to write the returned image (required)");
    println!("  --endpoint <url>       Image service endpoint (default {})", DEFAULT_ENDPOINT);
    println!("  --psf <name>           NIRCAM 300FM, NIRCAM 360FM or NONE");
    println!("  --<field> <value>      Any parameter, e.g. --alpha-in 3 --x-center 240");
    println!();
    println!("Parameters and defaults:");
    for field in Field::ALL {
        println!("  {:<16} {}", field.key(), field.default_text());
    }
}
