//! # Delta Arm
//!
//! Command-line client for the delta robot arm.
//!
//! Every subcommand except `selftest` connects to the arm, runs one
//! operation and closes the session, whether the operation succeeded or not.
//!
//! # Examples
//!
//! ```bash
//! delta-arm ping
//! delta-arm --host 127.0.0.1 --port 2616 point 0.01 -0.02 0
//! RUST_LOG=debug delta-arm xbox --config delta-arm.toml
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::{Cli, Cmd};
use delta_arm::arm::{ArmClient, CIRCLE_DURATION, CIRCLE_RADIUS, CIRCLE_STEP};
use delta_arm::config::Config;
use delta_arm::controller::{Driver, DriverSettings, XboxController};
use delta_arm::link::LinkSettings;
use delta_arm::protocol::decoder::decode_frame;
use delta_arm::protocol::encoder::encode_frame;
use delta_arm::protocol::Message;

/// Text carried by the self-test message
const SELFTEST_TEXT: &str = "Hello, world!";

#[tokio::main]
async fn main() -> Result<()> {
    // Keep the guard alive so buffered log lines are flushed on exit
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.cmd == Cmd::Selftest {
        let size = selftest()?;
        info!("Self-test passed ({} byte frame)", size);
        return Ok(());
    }

    let settings = LinkSettings::from(&config.arm);
    let mut arm = ArmClient::connect(&settings)
        .await
        .with_context(|| format!("connecting to {}", settings.address))?;
    info!("Connected to arm at {}", settings.address);

    let result = run(&cli.cmd, &config, &mut arm).await;
    arm.close();
    result
}

/// Run one subcommand against a connected arm
async fn run(cmd: &Cmd, config: &Config, arm: &mut ArmClient) -> Result<()> {
    match cmd {
        Cmd::Ping => {
            arm.ping().await?;
        }
        Cmd::Start => arm.start().await?,
        Cmd::Stop => arm.stop().await?,
        Cmd::Get => arm.get_status().await?,
        Cmd::Point(point) => arm.move_to(point.x, point.y, point.z).await?,
        Cmd::Circle => {
            arm.trace_circle(CIRCLE_RADIUS, CIRCLE_DURATION, CIRCLE_STEP)
                .await?;
        }
        Cmd::Listen => listen(arm).await?,
        Cmd::Xbox => xbox(config, arm).await?,
        Cmd::Selftest => {
            selftest()?;
        }
    }
    Ok(())
}

/// Log unsolicited messages until the arm hangs up or Ctrl+C
async fn listen(arm: &mut ArmClient) -> Result<()> {
    info!("Listening, press Ctrl+C to exit");
    let mut listener = arm.listen();

    loop {
        tokio::select! {
            next = listener.next() => match next {
                Some(Ok(Message::Info { text })) => info!("Info: {}", text),
                Some(Ok(message)) => debug!("{:?}", message),
                Some(Err(e)) => return Err(e).context("listening"),
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                return Ok(());
            }
        }
    }
}

/// Steer the arm with the controller until Ctrl+C
async fn xbox(config: &Config, arm: &mut ArmClient) -> Result<()> {
    let read_timeout_ms = i32::try_from(config.controller.read_timeout_ms).unwrap_or(i32::MAX);
    let controller = XboxController::discover(
        config.controller.vendor_id,
        config.controller.product_id,
        read_timeout_ms,
    )
    .await?;
    info!("Controller opened at: {}", controller.device_path());

    let mut driver = Driver::new(controller, DriverSettings::from(config));
    let shutdown = async {
        // A failed signal handler just means Ctrl+C won't stop the loop
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
        }
    };

    let iterations = driver.start(arm, shutdown).await?;
    info!("Total positions sent: {}", iterations);
    Ok(())
}

/// Encode and decode an `Info` message, returning the frame size
fn selftest() -> Result<usize> {
    let message = Message::Info {
        text: SELFTEST_TEXT.to_string(),
    };

    let frame = encode_frame(&message)?;
    let (decoded, consumed) = decode_frame(&frame)?;

    anyhow::ensure!(
        decoded == message,
        "decoded message differs: {:?} != {:?}",
        decoded,
        message
    );
    anyhow::ensure!(
        consumed == frame.len(),
        "decoder consumed {} of {} bytes",
        consumed,
        frame.len()
    );

    debug!("Self-test frame: {:02X?}", &frame[..]);
    Ok(frame.len())
}
