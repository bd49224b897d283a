//! Desktop window for `tempgraph`.
//!
//! Owns the Iced application loop and wires together all background tasks:
//! - MQTT ingestion worker (appends readings to the shared window)
//! - Render loop (snapshots the window every refresh period)
//! - Connection state feed (status line)
//! - Config file watcher (live chart / theme reload)
//! - Ctrl-C handler

pub mod chart;

use chart::Surface;
use chrono::{DateTime, Local};
use futures::{channel::mpsc::Sender, SinkExt};
use iced::{
    widget::{canvas, column, container, text},
    window, Alignment, Element, Length, Size, Subscription, Task,
};
use std::path::PathBuf;
use std::time::Duration;
use tempgraph_config::{default_path, load as load_config, restart_required, ChartConfig, GraphConfig};
use tempgraph_core::{event::Message as AppMessage, BoundedSeries, ConnectionState};
use tempgraph_ingest::{IngestionWorker, MqttSource};
use tempgraph_render::{present_or_log, RenderLoop};
use tempgraph_theme::Theme;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long shutdown waits for the worker to disconnect from the broker.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// ── Entry point ───────────────────────────────────────────────────────────────

/// Open the monitor window.  Returns when the window is closed or Ctrl-C is
/// received.
pub fn run() -> iced::Result {
    iced::application(Monitor::new, Monitor::update, Monitor::view)
        .title("Live MQTT Temperature Monitor")
        .subscription(Monitor::subscription)
        .style(Monitor::style)
        .window(window::Settings {
            size: Size::new(680.0, 480.0),
            // Closing goes through `Shutdown` so the worker can disconnect.
            exit_on_close_request: false,
            ..Default::default()
        })
        .run()
}

// ── Message ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Message {
    /// Propagate a core event-bus message.
    App(AppMessage),
    /// Shutdown grace period elapsed.
    ExitDeadline,
}

// ── State ─────────────────────────────────────────────────────────────────────

struct Monitor {
    config:      GraphConfig,
    config_path: PathBuf,
    theme:       Theme,
    surface:     Surface,
    updated_at:  Option<DateTime<Local>>,
    connection:  ConnectionState,
    /// `host:port | topic`, fixed for the process lifetime.
    endpoint:    String,
    chart_tx:    watch::Sender<ChartConfig>,
    cancel:      CancellationToken,
    closing:     bool,
}

impl Monitor {
    fn new() -> (Self, Task<Message>) {
        let config_path = default_path();
        let config = load_config(&config_path).unwrap_or_else(|e| {
            warn!("{e}; using defaults");
            GraphConfig::default()
        });
        let theme = Theme::from_config(&config.theme);
        let cancel = CancellationToken::new();

        // The only state shared between ingestion and rendering.
        let series = BoundedSeries::new(config.window.capacity);

        let worker = IngestionWorker::new(
            MqttSource::new(&config.broker),
            series.clone(),
            config.broker.topic.clone(),
            config.broker.reconnect_delay(),
        );
        let connection = worker.state();

        let (chart_tx, chart_rx) = watch::channel(config.chart.clone());
        let render = RenderLoop::new(series, config.window.refresh_period(), chart_rx);

        info!(
            host = %config.broker.host,
            port = config.broker.port,
            topic = %config.broker.topic,
            capacity = config.window.capacity.get(),
            "Monitor starting"
        );

        let monitor = Self {
            surface:    Surface::new(&theme, (config.chart.y_min, config.chart.y_max)),
            endpoint:   format!(
                "{}:{} | Topic: {}",
                config.broker.host, config.broker.port, config.broker.topic
            ),
            updated_at: None,
            connection: ConnectionState::Disconnected,
            chart_tx,
            cancel: cancel.clone(),
            closing: false,
            config,
            config_path,
            theme,
        };

        let tasks = Task::batch([
            Task::perform(worker.run(cancel.clone()), |()| {
                Message::App(AppMessage::IngestStopped)
            }),
            Task::stream(frame_stream(render, cancel.clone())),
            Task::stream(connection_stream(connection)),
            Task::stream(config_stream(monitor.config_path.clone(), cancel)),
            Task::perform(tokio::signal::ctrl_c(), |_| Message::App(AppMessage::Shutdown)),
        ]);

        (monitor, tasks)
    }

    // ── Update ────────────────────────────────────────────────────────────────

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::App(msg) => self.handle_app(msg),
            Message::ExitDeadline => {
                warn!("Ingestion worker did not stop in time; exiting anyway");
                iced::exit()
            }
        }
    }

    fn handle_app(&mut self, msg: AppMessage) -> Task<Message> {
        match msg {
            AppMessage::Frame(frame) => {
                // Failures are logged and the next tick tries again.
                if present_or_log(&frame, &mut self.surface) {
                    self.updated_at = frame.updated_at;
                }
            }
            AppMessage::Connection(state) => {
                self.connection = state;
            }
            AppMessage::ConfigReloaded => self.reload_config(),
            AppMessage::IngestStopped => {
                if self.closing {
                    return iced::exit();
                }
                warn!("Ingestion worker exited unexpectedly");
            }
            AppMessage::Shutdown => {
                if !self.closing {
                    info!("Shutting down");
                    self.closing = true;
                    self.cancel.cancel();
                    return Task::perform(tokio::time::sleep(SHUTDOWN_GRACE), |()| {
                        Message::ExitDeadline
                    });
                }
            }
        }
        Task::none()
    }

    fn reload_config(&mut self) {
        let cfg = match load_config(&self.config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return;
            }
        };

        for section in restart_required(&self.config, &cfg) {
            warn!("[{section}] changed; restart to apply");
        }

        self.theme = Theme::from_config(&cfg.theme);
        self.surface.chart.set_palette(&self.theme);
        self.chart_tx.send_replace(cfg.chart.clone());
        self.config = cfg;
        info!("Config reloaded");
    }

    // ── View ──────────────────────────────────────────────────────────────────

    fn view(&self) -> Element<'_, Message> {
        let size = self.theme.font_size;
        let muted = self.theme.foreground.with_alpha(0.6).to_iced();

        let title = text("Live Temperature Data").size(size * 1.5);
        let status = text(format!("Broker: {} | {}", self.endpoint, self.connection))
            .size(size * 0.8)
            .color(muted);
        let current = text(&self.surface.label)
            .size(size * 1.25)
            .color(self.theme.accent.to_iced());
        let updated = text(match self.updated_at {
            Some(at) => format!("Last reading at {}", at.format("%H:%M:%S")),
            None => String::new(),
        })
        .size(size * 0.75)
        .color(muted);

        let plot = canvas(&self.surface.chart)
            .width(Length::Fill)
            .height(Length::Fixed(300.0));

        let content = column![title, status, current, updated, plot]
            .spacing(12.0)
            .align_x(Alignment::Center)
            .max_width(640.0);

        container(content)
            .padding(20.0)
            .center(Length::Fill)
            .into()
    }

    // ── Subscriptions ─────────────────────────────────────────────────────────

    fn subscription(&self) -> Subscription<Message> {
        window::close_requests().map(|_| Message::App(AppMessage::Shutdown))
    }

    // ── Style ─────────────────────────────────────────────────────────────────

    fn style(&self, _theme: &iced::Theme) -> iced::theme::Style {
        iced::theme::Style {
            background_color: self.theme.background.to_iced(),
            text_color: self.theme.foreground.to_iced(),
        }
    }
}

// ── Background streams ────────────────────────────────────────────────────────
//
// Each stream runs on Iced's Tokio executor and only ever sends messages; all
// state changes happen in `update` on the display task.

/// Starts the render loop and forwards its frames.
fn frame_stream(
    render: RenderLoop,
    cancel: CancellationToken,
) -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(2, move |mut sender: Sender<Message>| async move {
        let mut frames = render.spawn(cancel);

        while let Some(frame) = frames.recv().await {
            // A full queue means the UI is behind; the next frame supersedes this one.
            let _ = sender.try_send(Message::App(AppMessage::Frame(frame)));
        }
    })
}

/// Forwards every connection state change of the ingestion worker.
fn connection_stream(
    mut state: watch::Receiver<ConnectionState>,
) -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(4, move |mut sender: Sender<Message>| async move {
        loop {
            let current = *state.borrow_and_update();
            // Every transition is shown, so wait for room instead of dropping.
            if sender.send(Message::App(AppMessage::Connection(current))).await.is_err() {
                break; // display task gone
            }

            if state.changed().await.is_err() {
                break; // worker dropped
            }
        }
    })
}

/// Watches the config file and sends `ConfigReloaded` on every change.
fn config_stream(
    path: PathBuf,
    cancel: CancellationToken,
) -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(1, move |mut sender: Sender<Message>| async move {
        let mut rx = tempgraph_config::spawn_watcher(path, cancel);

        while rx.recv().await.is_some() {
            let _ = sender.try_send(Message::App(AppMessage::ConfigReloaded));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn connection(message: Option<Message>) -> Option<ConnectionState> {
        match message {
            Some(Message::App(AppMessage::Connection(state))) => Some(state),
            _ => None,
        }
    }

    #[tokio::test]
    async fn forwards_every_connection_state() {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        let mut stream = Box::pin(connection_stream(rx));

        assert_eq!(connection(stream.next().await), Some(ConnectionState::Disconnected));

        for state in [
            ConnectionState::Connecting,
            ConnectionState::Subscribed,
            ConnectionState::Disconnected,
            ConnectionState::Connecting,
        ] {
            tx.send_replace(state);
            assert_eq!(connection(stream.next().await), Some(state));
        }

        drop(tx);
        assert!(stream.next().await.is_none());
    }
}
