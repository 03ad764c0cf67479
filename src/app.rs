//! Main application state and UI.

use crate::feed::{DemoFeed, Feed, FeedPoller, FileFeed};
use crate::graph::paint;
use crate::graph::status::StatusStore;
use crate::graph::topology::Topology;
use crate::graph::types::{format_latency, Entity, HealthState};
use crate::graph::{RepaintHost, SurfaceStatus, TopologyEngine, View, ViewController};
use crate::settings::Settings;
use crate::theme;
use crate::Args;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Minimum gap between settings writes
const SETTINGS_SAVE_DEBOUNCE: Duration = Duration::from_secs(2);

/// One row of the list view
#[derive(Debug, Clone, PartialEq)]
struct ListRow {
    name: String,
    state: HealthState,
    latency: Option<String>,
    dependencies: String,
}

/// Feed, poll and startup-view choices for this run.
///
/// Command-line flags win over saved settings but are never written back.
#[derive(Debug, Clone, PartialEq)]
struct EffectiveConfig {
    entities_path: Option<PathBuf>,
    health_path: Option<PathBuf>,
    poll_interval: Duration,
    view: View,
    demo: bool,
}

fn effective_config(settings: &Settings, args: &Args) -> EffectiveConfig {
    let (entities_path, health_path) = if args.entities.is_some() {
        (args.entities.clone(), args.health.clone())
    } else {
        (settings.entities_path.clone(), settings.health_path.clone())
    };
    EffectiveConfig {
        entities_path,
        health_path,
        poll_interval: args
            .poll_secs
            .map_or_else(|| settings.poll_interval(), Settings::poll_interval_from),
        view: args.view.unwrap_or(settings.view),
        demo: args.demo,
    }
}

/// Main dashboard application
pub struct DashboardApp {
    engine: TopologyEngine,
    host: RepaintHost,
    views: ViewController,
    poller: FeedPoller,

    // View switch requested from the toolbar, applied once the viewport is known
    pending_view: Option<View>,

    // Settings persistence
    settings: Settings,
    settings_dirty: bool,
    last_settings_save: Instant,
}

impl DashboardApp {
    pub fn new(cc: &eframe::CreationContext<'_>, args: Args) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let settings = Settings::load();
        let config = effective_config(&settings, &args);

        let feed = build_feed(&config);
        tracing::info!("Using {}", feed.describe());
        let poller = FeedPoller::new(feed, config.poll_interval);

        let mut host = RepaintHost::new(cc.egui_ctx.clone());
        let mut engine = TopologyEngine::new(settings.layout, settings.animation);
        if cc.gl.is_none() {
            engine.mark_surface_unsupported(&mut host);
        }

        Self {
            engine,
            host,
            views: ViewController::new(),
            poller,
            pending_view: Some(config.view),
            settings,
            settings_dirty: false,
            last_settings_save: Instant::now(),
        }
    }

    fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    fn maybe_save_settings(&mut self) {
        if self.settings_dirty && self.last_settings_save.elapsed() >= SETTINGS_SAVE_DEBOUNCE {
            self.settings.save();
            self.settings_dirty = false;
            self.last_settings_save = Instant::now();
        }
    }

    /// Pull fresh inputs from the feed. Never called from inside a frame tick.
    fn poll_feed(&mut self) {
        let Some(update) = self.poller.poll_if_due(Instant::now()) else {
            return;
        };
        if let Some(entities) = update.entities {
            self.engine.set_entities(entities, &mut self.host);
        }
        if let Some(health) = update.health {
            self.engine.apply_health(&health);
        }
    }

    fn render_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Service Status");
            ui.separator();
            for view in [View::List, View::Graph] {
                let selected = self.views.current() == view;
                if ui.selectable_label(selected, view.label()).clicked() && !selected {
                    self.pending_view = Some(view);
                    self.settings.view = view;
                    self.mark_settings_dirty();
                }
            }
            ui.separator();
            if ui.checkbox(&mut self.settings.show_labels, "Labels").changed() {
                self.mark_settings_dirty();
            }
        });
    }

    fn render_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for (state, count) in health_counts(self.engine.entities(), self.engine.store()) {
                if count == 0 {
                    continue;
                }
                ui.colored_label(state.color(), "●");
                ui.label(format!("{} {}", count, state.label()));
            }
            let cycles = cycle_summaries(self.engine.entities(), self.engine.topology());
            if !cycles.is_empty() {
                ui.separator();
                let text = if cycles.len() == 1 {
                    "1 dependency cycle".to_string()
                } else {
                    format!("{} dependency cycles", cycles.len())
                };
                ui.label(
                    egui::RichText::new(text)
                        .color(theme::health::DEGRADED)
                        .small(),
                )
                .on_hover_text(cycles.join("\n"));
            }
            ui.separator();
            ui.label(
                egui::RichText::new(self.poller.describe())
                    .color(theme::text::MUTED)
                    .small(),
            );
            if let Some(at) = self.poller.last_success() {
                ui.label(
                    egui::RichText::new(format!("updated {}", at.format("%H:%M:%S")))
                        .color(theme::text::MUTED)
                        .small(),
                );
            }
            if let Some(err) = self.poller.last_error() {
                ui.label(
                    egui::RichText::new(err)
                        .color(theme::health::DOWN)
                        .small(),
                );
            }
            if self.views.current() == View::Graph {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let scheduler = self.engine.scheduler();
                    let label = if scheduler.is_running() {
                        format!("animating · {} frames", scheduler.frames())
                    } else {
                        "idle".to_string()
                    };
                    ui.label(egui::RichText::new(label).color(theme::text::MUTED).small());
                });
            }
        });
    }

    fn render_list(&mut self, ui: &mut egui::Ui) {
        let rows = list_rows(
            self.engine.entities(),
            self.engine.topology(),
            self.engine.store(),
        );
        if rows.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new("No services configured").color(theme::text::MUTED));
            });
            return;
        }

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::exact(24.0))
            .column(Column::initial(220.0).at_least(120.0))
            .column(Column::initial(110.0))
            .column(Column::initial(90.0))
            .column(Column::remainder())
            .header(22.0, |mut header| {
                header.col(|_| {});
                header.col(|ui| {
                    ui.strong("Service");
                });
                header.col(|ui| {
                    ui.strong("Status");
                });
                header.col(|ui| {
                    ui.strong("Latency");
                });
                header.col(|ui| {
                    ui.strong("Depends on");
                });
            })
            .body(|mut body| {
                for row in &rows {
                    body.row(22.0, |mut table_row| {
                        table_row.col(|ui| {
                            ui.colored_label(row.state.color(), "●");
                        });
                        table_row.col(|ui| {
                            ui.label(&row.name);
                        });
                        table_row.col(|ui| {
                            ui.colored_label(row.state.color(), row.state.label());
                        });
                        table_row.col(|ui| {
                            ui.label(row.latency.as_deref().unwrap_or("—"));
                        });
                        table_row.col(|ui| {
                            ui.label(
                                egui::RichText::new(&row.dependencies).color(theme::text::SECONDARY),
                            );
                        });
                    });
                }
            });
    }

    fn render_graph(&mut self, ui: &mut egui::Ui) {
        if self.engine.surface() == SurfaceStatus::Unsupported {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("Topology view is not supported on this display")
                        .color(theme::text::MUTED),
                );
            });
            return;
        }

        let viewport = ui.available_size();
        self.engine.resize(viewport);

        // Deliver the scheduler's pending frame, if one is due
        if let Some(request) = self.host.take_due() {
            let time = ui.input(|i| i.time);
            self.engine.frame(&mut self.host, request, time);
        }

        let surface = self
            .engine
            .layout()
            .map(|l| l.surface)
            .unwrap_or(viewport);
        let show_labels = self.settings.show_labels;
        let engine = &mut self.engine;

        egui::ScrollArea::both()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let (response, painter) = ui.allocate_painter(surface, egui::Sense::hover());
                let origin = response.rect.min.to_vec2();
                let pointer = response.hover_pos().map(|p| p - origin);
                engine.pointer(pointer, origin);
                paint::paint_surface(ui, &painter, origin, engine, show_labels);
            });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_feed();
        self.maybe_save_settings();

        // Dark theme
        ctx.set_visuals(egui::Visuals::dark());

        egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0)),
            )
            .show(ctx, |ui| {
                self.render_toolbar(ui);
            });

        egui::TopBottomPanel::bottom("status")
            .frame(
                egui::Frame::none()
                    .fill(theme::bg::PANEL)
                    .inner_margin(egui::Margin::symmetric(12.0, 4.0)),
            )
            .show(ctx, |ui| {
                self.render_status_bar(ui);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(theme::bg::GRAPH))
            .show(ctx, |ui| {
                if let Some(view) = self.pending_view.take() {
                    let viewport = ui.available_size();
                    self.views
                        .switch_to(view, &mut self.engine, &mut self.host, viewport);
                }
                match self.views.current() {
                    View::List => self.render_list(ui),
                    View::Graph => self.render_graph(ui),
                }
            });

        if self.views.current() == View::Graph {
            self.engine.tooltip().paint(ctx);
        }

        // Wake up for the next poll even when nothing animates
        ctx.request_repaint_after(self.poller.time_until_due(Instant::now()));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.engine.destroy(&mut self.host);
        // Force save settings on exit
        if self.settings_dirty {
            self.settings.save();
        }
    }
}

fn build_feed(config: &EffectiveConfig) -> Box<dyn Feed> {
    match (&config.entities_path, config.demo) {
        (Some(entities), false) => Box::new(FileFeed::new(
            entities.clone(),
            config.health_path.clone(),
        )),
        _ => Box::new(DemoFeed::new()),
    }
}

fn list_rows(entities: &[Entity], topology: &Topology, store: &StatusStore) -> Vec<ListRow> {
    entities
        .iter()
        .map(|entity| {
            let snapshot = store.get(&entity.key);
            let dependencies: Vec<&str> = topology
                .index_of(&entity.key)
                .map(|i| topology.dependencies_of(i))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|i| entities.get(i))
                .map(|e| e.display_name.as_str())
                .collect();
            ListRow {
                name: entity.display_name.clone(),
                state: snapshot.state,
                latency: snapshot.latency_ms.map(format_latency),
                dependencies: dependencies.join(", "),
            }
        })
        .collect()
}

/// One line per dependency cycle, naming its members
fn cycle_summaries(entities: &[Entity], topology: &Topology) -> Vec<String> {
    topology
        .dependency_cycles()
        .iter()
        .map(|cycle| {
            cycle
                .iter()
                .filter_map(|&i| entities.get(i))
                .map(|e| e.display_name.as_str())
                .collect::<Vec<_>>()
                .join(" ↔ ")
        })
        .collect()
}

/// Entity count per health state, in display order
fn health_counts(entities: &[Entity], store: &StatusStore) -> Vec<(HealthState, usize)> {
    HealthState::ALL
        .iter()
        .map(|&state| {
            let count = entities
                .iter()
                .filter(|e| store.state(&e.key) == state)
                .count();
            (state, count)
        })
        .collect()
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
