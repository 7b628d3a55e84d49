use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use safetrade_onboarding::config::WizardConfig;
use safetrade_onboarding::console;
use safetrade_onboarding::onboarding::{
    WizardDeps, WizardKind, WizardRegistry, WizardRouteState, spawn_sweep_task, wizard_routes,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = WizardConfig::from_env().context("invalid SAFETRADE_* configuration")?;
    let deps = WizardDeps::simulated(&config);

    // `console [sign_up|kyc]` walks one wizard on stdin instead of serving.
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() == Some("console") {
        let kind = match args.next() {
            Some(raw) => raw
                .parse::<WizardKind>()
                .map_err(anyhow::Error::msg)?,
            None => WizardKind::SignUp,
        };
        eprintln!("SafeTrade onboarding v{} ({kind})", env!("CARGO_PKG_VERSION"));
        eprintln!("   Type 'help' for commands, 'quit' to exit.\n");
        console::run(kind, &deps).await?;
        return Ok(());
    }

    let port = config.http_port;
    eprintln!("SafeTrade onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Wizard API: http://0.0.0.0:{}/api/wizards", port);
    eprintln!(
        "   OTP cooldown: {}s, simulated delay: {}ms, policy: {:?}",
        config.otp_cooldown_secs,
        config.simulated_delay.as_millis(),
        config.otp_policy
    );
    eprintln!("   Idle wizards dropped after {}s", config.idle_timeout.as_secs());

    let registry = WizardRegistry::new(deps);
    let _sweeper = spawn_sweep_task(
        registry.clone(),
        config.idle_timeout,
        std::time::Duration::from_secs(60),
    );
    let app = wizard_routes(WizardRouteState { registry })
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!(port, "Wizard HTTP server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
