use classroom_realtime::{
    BindCallbacks, ConnectionManager, ExerciseProgressFeed, RealtimeOptions, Subscription,
    SubscriptionBinder, handler,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Watches notifications and one exercise's progress against a live endpoint
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Reads REALTIME_WS_URL, loading .env first
    let mut options = RealtimeOptions::from_env().heartbeat_interval(Duration::from_secs(25));
    if let Ok(token) = std::env::var("REALTIME_ACCESS_TOKEN") {
        options = options.access_token(token);
    }
    let exercise_id = std::env::var("EXERCISE_ID").unwrap_or_else(|_| "1".to_string());

    let manager = ConnectionManager::new(options)?;
    let binder = SubscriptionBinder::new(manager.clone());
    let (session, auth) = watch::channel(true);

    let _notifications = binder.bind(
        auth.clone(),
        vec![Subscription::message(
            "notification",
            handler(|data| println!("🔔 notification: {}", data)),
        )],
        BindCallbacks::new()
            .on_connect(|| println!("🟢 live"))
            .on_disconnect(|| println!("🔴 offline")),
    );

    let _progress = ExerciseProgressFeed::bind(&binder, auth, &exercise_id, move |progress| {
        println!("📈 exercise progress: {}", progress);
    });

    println!("Listening, press Ctrl+C to log out");
    tokio::signal::ctrl_c().await?;

    // Logging out disconnects every binding on the same manager
    session.send(false)?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("Disconnected: {:?}", manager.current_state());

    Ok(())
}
