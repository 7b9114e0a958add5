//! Terminal rental watcher
//!
//! Keeps the signed-in user's rentals in sync with the server and logs every
//! change. Controls are read from stdin: `r` refreshes now, `h`
//! hides the view (stops polling), `s` shows it again, `q` quits.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;

use rentwear_server::client::{RentalApiClient, Session};
use rentwear_server::config::SyncConfig;
use rentwear_server::sync::{Cadence, Snapshot, SyncController, SyncScope};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = SyncConfig::from_env()?;
    let Some(session) = Session::load(&config.session_file).await? else {
        tracing::error!(
            path = %config.session_file.display(),
            "No saved session, sign in first"
        );
        std::process::exit(1);
    };

    let client = RentalApiClient::for_session(config.api_base_url.clone(), &session)?;
    let (handle, task) = SyncController::spawn(
        Arc::new(client),
        SyncScope::from(&session),
        Cadence::from_config(&config),
        true,
    );

    let mut snapshots = handle.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            log_snapshot(&snapshot);
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = stdin.next_line() => match line?.as_deref().map(str::trim) {
                Some("r") => handle.trigger_refresh().await,
                Some("h") => handle.set_visible(false).await,
                Some("s") => handle.set_visible(true).await,
                Some("q") | None => break,
                Some(other) => tracing::info!(input = other, "Commands: r, h, s, q"),
            },
            _ = signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
    task.await?;
    session.save(&config.session_file).await?;
    Ok(())
}

fn log_snapshot(snapshot: &Snapshot) {
    tracing::info!(
        seq = snapshot.seq,
        as_renter = snapshot.lists.as_renter.len(),
        as_owner = snapshot.lists.as_owner.len(),
        "Rentals updated"
    );
    for rental in snapshot
        .lists
        .as_renter
        .iter()
        .chain(snapshot.lists.as_owner.iter())
    {
        tracing::info!(
            rental_id = %rental.id,
            status = ?rental.status,
            delivery = ?rental.delivery_status,
            end_date = %rental.end_date,
            "  rental"
        );
    }
}
