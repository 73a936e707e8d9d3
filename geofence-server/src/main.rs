use std::time::Duration;

use clap::Parser;
use geofence_server::{web, Cli, Session};
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    log::info!(
        "Geofence server {} on port {}",
        env!("CARGO_PKG_VERSION"),
        args.port
    );

    let (session, worker) = Session::new(args)?;
    log::info!(
        "{} landmarks configured, radius {} m",
        session.landmarks.landmarks.len(),
        session.landmarks.radius_meters
    );
    session.registration.restore().await?;

    Toplevel::new(move |s| async move {
        s.start(SubsystemBuilder::new("transitions", move |s| worker.run(s)));
        s.start(SubsystemBuilder::new("web", move |s| web::serve(session, s)));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_millis(1000))
    .await?;

    Ok(())
}
