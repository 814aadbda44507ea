use std::sync::Arc;

use anyhow::Context;
use resto_client::logger::init_logger;
use resto_client::{MonitorConfig, Reconciler};
use shared::TableStatus;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    dotenv::dotenv().ok();
    let config = MonitorConfig::from_env();
    init_logger(&config.log_level, config.log_dir.as_deref());

    tracing::info!(base_url = %config.client.base_url, "Floor monitor starting...");

    // 2. 建立会话
    let client = config.client.build_client().context("building API client")?;
    let (client, session) = match (&config.email, &config.password) {
        (Some(email), Some(password)) if client.token().is_none() => {
            let session = client.login(email, password).await.context("login")?;
            tracing::info!(dashboard = ?session.dashboard(), "Session opened");
            (client.authenticated(&session), Some(session))
        }
        _ => (client, None),
    };

    // 3. 启动预约过期检查
    let (handle, worker) =
        Reconciler::spawn(Arc::new(client.clone()), config.reconcile_interval());
    let mut updates = handle.subscribe();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Ctrl-C received, shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    tracing::warn!("Reconciler stopped unexpectedly");
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if let Some(warning) = state.warning {
                    tracing::warn!("{warning}");
                }
                let now = shared::util::now_utc();
                let board = state.snapshot.board(now);
                let summary = shared::FloorSummary::from_board(&board);
                tracing::info!(
                    total = summary.total,
                    available = summary.available(),
                    reserved_soon = summary.reserved_soon,
                    reserved = summary.reserved,
                    occupied = summary.occupied,
                    "Floor updated"
                );
                for view in board.iter().filter(|v| v.status != TableStatus::Free) {
                    tracing::debug!(table = %view.table.name, status = ?view.status, "Table");
                }
            }
        }
    }

    handle.shutdown();
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Reconciler task failed");
    }

    if let Some(session) = session {
        let mut client = client;
        if let Err(e) = client.logout(session).await {
            tracing::warn!(error = %e, "Logout failed");
        }
    }

    tracing::info!("Floor monitor stopped");
    Ok(())
}
