//! Demo-Binary: native Loopback-Session auf der Kommandozeile
//!
//! Startet die Session mit Default-Constraints, druckt die
//! Verhandlungsschritte und den Settings-Snapshot, schaltet dann
//! `noiseSuppression` ab und zeigt den neu eingelesenen Stand.

use anyhow::Result;
use echolab::{native_connector, AudioConstraints};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    echolab::init_logging();

    let connector = native_connector();

    // Log-Signale auf stdout spiegeln
    let mut logs = connector.signals().subscribe_logs();
    tokio::spawn(async move {
        while let Ok(entry) = logs.recv().await {
            println!("{} [{}] {}", entry.timestamp, entry.label, entry.message);
        }
    });

    let mut names = connector.signals().subscribe_device_names();

    connector.start().await?;
    println!("status: {:?}", connector.status());

    if let Ok(name) = names.recv().await {
        println!("device: {}", name);
    }

    let snapshot = connector.check_audio_settings()?;
    println!("settings: {:?}", snapshot);

    // Kurz laufen lassen, dann Rauschunterdrückung abschalten
    tokio::time::sleep(Duration::from_secs(2)).await;

    let snapshot = connector
        .change_settings(AudioConstraints {
            noise_suppression: Some(false),
            ..Default::default()
        })
        .await?;
    println!("settings after change: {:?}", snapshot);

    tokio::time::sleep(Duration::from_secs(2)).await;

    connector.stop().await;
    println!("stopped");

    Ok(())
}
