use clap::Parser;
use sleepy_status::config::MonitorConfig;
use sleepy_status::monitor::{
    ActivitySession, Classifier, HttpPresenceSink, Publisher, SystemSignals,
};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 桌面活动监控：识别当前在做什么并上报到状态服务
#[derive(Debug, Parser)]
#[command(name = "sleepy-monitor", version)]
struct Args {
    /// 上报的用户键（覆盖 USER_KEY）
    #[arg(long)]
    user: Option<String>,

    /// 服务地址，例如 http://127.0.0.1:5000/api（覆盖 SERVER_URL）
    #[arg(long)]
    server_url: Option<String>,

    /// 轮询间隔秒数（覆盖 POLL_INTERVAL）
    #[arg(long)]
    interval: Option<u64>,

    /// 只执行一轮后退出
    #[arg(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = MonitorConfig::from_env_with(args.user.clone(), args.server_url.clone())
        .expect("Failed to load monitor configuration");
    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs.max(1));
    }

    let table = config
        .classification_table()
        .expect("Failed to load classification table");
    let classifier = Classifier::new(table, config.sleep_threshold, config.busy);
    let sink = HttpPresenceSink::new(
        &config.server_url,
        &config.shared_secret,
        config.publish_timeout,
    )
    .expect("Failed to build HTTP client");

    tracing::info!("Monitoring user {}", config.user_key);
    tracing::info!("Publishing to {}", sink.endpoint());
    tracing::info!(
        "Poll interval {}s, sleep after {} minutes without activity",
        config.poll_interval.as_secs(),
        config.sleep_threshold.as_secs() / 60
    );

    let mut publisher = Publisher::new(
        SystemSignals::new(config.signal_timeout),
        sink,
        classifier,
        &config.user_key,
    );

    if args.once {
        let mut session = ActivitySession::new(chrono::Utc::now());
        let outcome = publisher.tick(&mut session, chrono::Utc::now()).await;
        tracing::info!("Single tick finished: {:?}", outcome);
        return;
    }

    publisher
        .run(config.poll_interval, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
}
