use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use conclave::bbb::Bbb;
use conclave::config::Config;
use conclave::hub::handlers;
use conclave::hub::outbox::OverflowPolicy;
use conclave::hub::registry::Registry;
use conclave::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conclave=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let bbb = Bbb::new(&config.bbb_url, &config.bbb_secret)
        .expect("CONCLAVE_BBB_URL must be a valid URL");

    let state = AppState {
        bbb: Arc::new(bbb),
        registry: Arc::new(Registry::new()),
        router: Arc::new(handlers::router()),
        outbox_capacity: config.outbox_capacity,
        overflow: config.overflow,
    };

    let app = conclave::routes::router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await.expect("failed to bind port");
    tracing::info!("listening on {addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let overflow = match config.overflow {
        OverflowPolicy::DropNew => "drop-new",
        OverflowPolicy::DropOldest => "drop-oldest",
    };

    eprintln!();
    eprintln!("  \x1b[1;36mconclave\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m       {}", config.port);
    eprintln!("  \x1b[2mbbb api\x1b[0m    {}", config.bbb_url);
    eprintln!(
        "  \x1b[2moutbox\x1b[0m     {} events, {overflow}",
        config.outbox_capacity
    );
    eprintln!();
}
