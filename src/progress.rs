//! 进度追踪
//!
//! 共享的原子计数器是唯一的数据来源。后台任务按固定间隔把计数同步到
//! indicatif 进度条上，只读不写，不会阻塞任何工作任务。

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::{ProgressSnapshot, ProgressState};

/// 默认刷新间隔
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// 百分比、速率、剩余时间、已用时间和存活数
const PROGRESS_TEMPLATE: &str =
    "[{bar:40.green}] {percent}% ({pos}/{len}) | {per_sec} | ETA: {eta} | Elapsed: {elapsed} | Alive: {msg}";

/// 进度条样式，40格
pub fn progress_style() -> ProgressStyle {
    ProgressStyle::with_template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▒")
}

/// 进度追踪器，`stop` 时会同步一次最终状态并结束进度条
pub struct ProgressTracker {
    state: Arc<ProgressState>,
    bar: ProgressBar,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl ProgressTracker {
    /// 在标准错误上启动进度条
    pub fn start(state: Arc<ProgressState>, interval: Duration) -> Self {
        let bar = ProgressBar::new(state.total());
        Self::start_with_bar(state, interval, bar)
    }

    /// 使用给定的进度条，测试中可传入 `ProgressBar::hidden()`
    pub fn start_with_bar(state: Arc<ProgressState>, interval: Duration, bar: ProgressBar) -> Self {
        bar.set_length(state.total());
        bar.set_style(progress_style());
        sync(&bar, &state.snapshot());

        let (shutdown, mut shutdown_rx) = oneshot::channel::<()>();
        let task_state = Arc::clone(&state);
        let task_bar = bar.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => sync(&task_bar, &task_state.snapshot()),
                    _ = &mut shutdown_rx => return,
                }
            }
        });

        ProgressTracker {
            state,
            bar,
            shutdown,
            handle,
        }
    }

    /// 底层进度条
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    /// 停止追踪并返回最终快照
    pub async fn stop(self) -> ProgressSnapshot {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;

        let last = self.state.snapshot();
        sync(&self.bar, &last);
        self.bar.finish();
        last
    }
}

fn sync(bar: &ProgressBar, snapshot: &ProgressSnapshot) {
    bar.set_position(snapshot.completed);
    bar.set_message(snapshot.alive.to_string());
}
