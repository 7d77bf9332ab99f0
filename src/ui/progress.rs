use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::warn;

use crate::synth::TxProgress;

pub mod templates {
    pub const TRANSMIT: &str =
        "\u{f048a} OOK  [{bar:30.cyan}] {percent}% ({pos}/{len} bits) {msg}";
    /// 长度未知时使用
    pub const STREAMING: &str = "{spinner:.cyan} OOK  {pos} bits {msg}";
}

/// 发送进度条
///
/// 位置是已合成的 bit 数，消息是发送器的状态文本。
/// 总长度为 0 时退化为 spinner。
pub struct TxProgressBar {
    bar: ProgressBar,
    total: u64,
}

impl TxProgressBar {
    pub fn new(total: u64, status: &str) -> Self {
        Self::with_target(total, status, ProgressDrawTarget::stderr())
    }

    /// 指定绘制目标（测试中使用 hidden）
    pub fn with_target(total: u64, status: &str, target: ProgressDrawTarget) -> Self {
        let (len, template) = if total == 0 {
            (None, templates::STREAMING)
        } else {
            (Some(total), templates::TRANSMIT)
        };

        let bar = ProgressBar::with_draw_target(len, target);
        match ProgressStyle::default_bar().template(template) {
            Ok(style) => bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ ")),
            Err(err) => warn!("Template error: {}", err),
        }
        if total == 0 {
            bar.enable_steady_tick(Duration::from_millis(100));
        }
        bar.set_message(status.to_string());

        Self { bar, total }
    }

    /// 更新位置与状态
    pub fn update(&self, progress: &TxProgress, status: &str) {
        let bits = if self.total == 0 {
            progress.bits
        } else {
            progress.bits.min(self.total)
        };
        self.bar.set_position(bits);
        self.bar.set_message(status.to_string());
    }

    /// 完成进度条（保留显示）
    pub fn finish(&self, progress: &TxProgress, status: &str) {
        self.update(progress, status);
        self.bar.finish_with_message(status.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.bar.is_finished()
    }
}
