mod app;

use anyhow::Result;
use app::App;
use iced::Application;

use disk_imager::config::{parse_args, usage, Invocation};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_args(&args)? {
        Invocation::Help => {
            println!("{}", usage());
            return Ok(());
        }
        Invocation::Run(config) => config,
    };
    log::info!("endpoint {} ({} policy)", config.endpoint, config.policy);

    let mut settings = iced::Settings::with_flags(config);
    settings.window.size = (760, 980);
    App::run(settings)?;
    Ok(())
}
