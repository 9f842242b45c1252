//! # Proxmox Remote User Interface
//!
//! A single screen: the server title, the ping and RSSI gauges and the
//! `TURN ON` button, with a thin status strip at the bottom.
//!
//! Each frame the UI drains the inbound channels filled by the MQTT
//! gateway, applies the messages to its [`PresentationSync`] and redraws
//! from the derived display state. Reads are non-blocking so a silent broker
//! never stalls rendering; the app stays usable and simply shows
//! "NodeMCU offline".
//!
//! The push registration outcome arrives once on a oneshot channel. A failure
//! opens a modal alert that the user dismisses.

pub mod common;
pub mod dashboard;
pub mod gauge;

use eframe::egui::{self, Id, Modal, RichText};
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

use crate::mqtt::message_manager::InboundReceiver;
use crate::mqtt::mqtt_handler::MQTTStatus;
use crate::mqtt::publisher::MqttPublisher;
use crate::push::PushError;
use crate::telemetry::{Palette, PresentationSync};

use self::common::{create_frame, UiColors};
use self::dashboard::PressTracker;

pub use common::MQTTServer;

pub struct ProxmoxRemoteUI {
    sync: PresentationSync<MqttPublisher>,

    /// Inbound messages forwarded by the gateway handler
    inbound: InboundReceiver,

    status: watch::Receiver<MQTTStatus>,

    /// Taken once the registration task reports back
    push_outcome: Option<oneshot::Receiver<Result<String, PushError>>>,

    alert: Option<String>,

    press_tracker: PressTracker,

    server: MQTTServer,

    repaint_interval: Duration,
}

impl ProxmoxRemoteUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        publisher: MqttPublisher,
        inbound: InboundReceiver,
        status: watch::Receiver<MQTTStatus>,
        push_outcome: oneshot::Receiver<Result<String, PushError>>,
        server: MQTTServer,
        repaint_interval: Duration,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        ProxmoxRemoteUI {
            sync: PresentationSync::new(publisher),
            inbound,
            status,
            push_outcome: Some(push_outcome),
            alert: None,
            press_tracker: PressTracker::default(),
            server,
            repaint_interval,
        }
    }

    fn drain_messages(&mut self) {
        for message in self.inbound.drain() {
            match self.sync.apply_message(&message) {
                Ok(applied) => debug!("Applied {}: {:?}", message.topic, applied),
                Err(e) => warn!("Discarding telemetry '{}': {}", message.content, e),
            }
        }
    }

    fn poll_push_outcome(&mut self) {
        let Some(rx) = self.push_outcome.as_mut() else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(_)) => {
                info!("Push notifications registered");
                self.push_outcome = None;
            }
            Ok(Err(e)) => {
                self.alert = Some(e.alert_text());
                self.push_outcome = None;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("Push registration task ended without an outcome");
                self.push_outcome = None;
            }
        }
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(text) = self.alert.clone() else {
            return;
        };
        let modal = Modal::new(Id::new("push_alert")).show(ctx, |ui| {
            ui.set_width(280.0);
            ui.label(text);
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });
        if modal.inner || modal.should_close() {
            self.alert = None;
        }
    }

    fn status_strip(&self, ui: &mut egui::Ui) {
        let status = self.status.borrow().clone();
        let dot_color = if status.is_connected() {
            UiColors::ACTIVE
        } else {
            UiColors::INACTIVE
        };
        create_frame(UiColors::INNER_BG, UiColors::BORDER).show(ui, |ui| {
            ui.horizontal_centered(|ui| {
                let dot = ui.colored_label(dot_color, "\u{2B24}");
                if let Some(error) = &status.last_error {
                    dot.on_hover_text(error.as_str());
                }
                ui.label(RichText::new(self.server.to_string()).color(UiColors::MUTED_TEXT));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(traffic_label(&status)).color(UiColors::MUTED_TEXT),
                    );
                });
            });
        });
    }
}

fn traffic_label(status: &MQTTStatus) -> String {
    format!(
        "rx {} / tx queued {}",
        status.messages_received, status.messages_queued
    )
}

impl eframe::App for ProxmoxRemoteUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        self.poll_push_outcome();

        egui::TopBottomPanel::bottom("status_panel")
            .show_separator_line(false)
            .frame(egui::Frame::new().fill(Palette::BACKGROUND))
            .show(ctx, |ui| self.status_strip(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(Palette::BACKGROUND))
            .show(ctx, |ui| {
                ui.ctx().request_repaint_after(self.repaint_interval);
                dashboard::render(ui, &mut self.sync, &mut self.press_tracker);
            });

        self.show_alert(ctx);
    }
}
