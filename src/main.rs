use nova_signal::signaling::{DEFAULT_SIGNALING_PORT, SignalingServer};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_SIGNALING_PORT);
    let bind_addr = format!("0.0.0.0:{}", port);

    println!("   Nova Signaling Relay");
    println!("   Binding to {}", bind_addr);
    println!("   Press Ctrl+C to stop\n");

    let server = SignalingServer::new();

    tokio::select! {
        result = server.run(&bind_addr) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}
