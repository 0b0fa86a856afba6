use clap::Parser;
use dailyhaiku::cli::PoolLocation;
use dailyhaiku::config::{Config, setup_logging};
use dailyhaiku::cursor::CursorStore;
use dailyhaiku::generator::OpenAiGenerator;
use dailyhaiku::pipeline::Pipeline;
use dailyhaiku::pool::{LocalDirSource, PoolSource, RemoteDirSource};
use dailyhaiku::publisher::{AnyPublisher, FtpPublisher, LocalPublisher};
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = dailyhaiku::cli::CliOptions::parse();

    if setup_logging(cli.debug).is_err() {
        return ExitCode::FAILURE;
    }

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let source = match (config.pool_source, config.ftp.clone()) {
        (PoolLocation::Remote, Some(ftp)) => {
            PoolSource::Remote(RemoteDirSource::new(ftp, &config.remote_pool_dir))
        }
        _ => PoolSource::Local(LocalDirSource::new(&config.image_dir)),
    };

    let publisher = match (config.skip_upload, config.ftp.clone()) {
        (false, Some(ftp)) => AnyPublisher::Ftp(FtpPublisher::new(&config.output_file, ftp)),
        _ => AnyPublisher::Local(LocalPublisher::new(&config.output_file)),
    };

    let generator = match OpenAiGenerator::new(config.generator.clone()) {
        Ok(generator) => generator,
        Err(err) => {
            error!("{:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let pipeline = Pipeline::new(
        source,
        generator,
        publisher,
        CursorStore::new(&config.used_images_file),
    )
    .with_mode(config.cursor)
    .with_public_base_url(config.public_base_url.clone());

    match pipeline.run().await {
        Ok(report) => {
            if let Some(record) = report.record {
                info!("{} {}: {}", record.date, record.image, record.haiku);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Run aborted: {}", err);
            ExitCode::FAILURE
        }
    }
}
