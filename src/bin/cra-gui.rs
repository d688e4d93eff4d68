/*!
 * Desktop front end for cra-rs - Crypto Reddit Advisor
 *
 * - First-run disclaimer with an optional "remember" choice
 * - Topic / result count / upvote floor form
 * - Ranked post cards, totals and an upvotes bar list
 * - Export of the current result set to CSV, JSON or a chart file
 */

use anyhow::Result;
use cra_rs::consent::DISCLAIMER;
use cra_rs::{
    Config, ConsentPreference, DerivedView, FilePreferenceStore, HttpTransport, ResultPayload,
    SearchClient, SearchState, aggregate, chart, storage,
};
use eframe::egui;
use num_format::{Locale, ToFormattedString};
use std::path::Path;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Crypto Reddit Advisor"),
        ..Default::default()
    };

    eframe::run_native(
        "Crypto Reddit Advisor",
        options,
        Box::new(|_cc| match CraApp::new(Config::from_env()) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => Err(e.into()),
        }),
    )
}

struct CraApp {
    // Form
    topic: String,
    max_results: String,
    min_upvotes: String,

    // Consent modal
    consent: ConsentPreference<FilePreferenceStore>,
    remember_choice: bool,

    client: SearchClient<HttpTransport>,
    /// Derived once per successful result, not per frame.
    view: Option<DerivedView>,

    form_error: String,
    status_message: String,
}

impl CraApp {
    fn new(cfg: Config) -> Result<Self> {
        let consent = ConsentPreference::new(
            FilePreferenceStore::new(&cfg.consent_path),
            cfg.consent_key.as_str(),
        );
        let client = SearchClient::new(HttpTransport::new(&cfg)?);
        Ok(Self {
            topic: String::new(),
            max_results: cra_rs::query::DEFAULT_MAX_RESULTS.to_string(),
            min_upvotes: cra_rs::query::DEFAULT_MIN_UPVOTES.to_string(),
            consent,
            remember_choice: false,
            client,
            view: None,
            form_error: String::new(),
            status_message: String::new(),
        })
    }

    fn start_search(&mut self) {
        self.status_message.clear();
        match self.client.search_raw(
            &self.topic,
            Some(self.max_results.as_str()),
            Some(self.min_upvotes.as_str()),
        ) {
            Ok(_) => {
                self.form_error.clear();
                self.view = None;
            }
            Err(e) => self.form_error = e.to_string(),
        }
    }

    fn go_home(&mut self) {
        self.client.reset();
        self.view = None;
        self.topic.clear();
        self.form_error.clear();
        self.status_message.clear();
    }

    fn check_search_result(&mut self) {
        if self.client.poll() {
            self.view = self.client.state().payload().map(aggregate::derive_view);
        }
    }

    fn export(&mut self, payload: &ResultPayload, kind: ExportKind) {
        let (name, filter, exts): (&str, &str, &[&str]) = match kind {
            ExportKind::Csv => ("posts.csv", "CSV", &["csv"][..]),
            ExportKind::Json => ("posts.json", "JSON", &["json"][..]),
            ExportKind::Chart => ("upvotes.svg", "Chart", &["svg", "png"][..]),
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(name)
            .add_filter(filter, exts)
            .save_file()
        else {
            return;
        };
        match write_export(payload, &path, kind) {
            Ok(()) => {
                self.status_message = format!("Saved {}", path.display());
                self.form_error.clear();
            }
            Err(e) => {
                self.status_message.clear();
                self.form_error = format!("Export failed: {e:#}");
            }
        }
    }

    fn consent_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("Before you continue")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(DISCLAIMER);
                ui.add_space(10.0);
                ui.checkbox(&mut self.remember_choice, "Remember my choice");
                ui.add_space(5.0);
                if ui.button("I Understand").clicked()
                    && let Err(e) = self.consent.acknowledge(self.remember_choice)
                {
                    log::warn!("{e:#}");
                    self.form_error = format!("Could not save your choice: {e:#}");
                }
            });
    }
}

#[derive(Debug, Clone, Copy)]
enum ExportKind {
    Csv,
    Json,
    Chart,
}

fn write_export(payload: &ResultPayload, path: &Path, kind: ExportKind) -> Result<()> {
    match kind {
        ExportKind::Csv => storage::save_csv(&payload.posts, path),
        ExportKind::Json => storage::save_json(&payload.posts, path),
        ExportKind::Chart => {
            let series = aggregate::chart_series(payload);
            chart::plot_series(&series, path, 900, 420)
        }
    }
}

fn fmt_count(v: u64) -> String {
    v.to_formatted_string(&Locale::en)
}

impl eframe::App for CraApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_search_result();

        if self.client.state().is_loading() {
            ctx.request_repaint();
        }

        if !self.consent.is_acknowledged() {
            self.consent_window(ctx);
        }
        let enabled = self.consent.is_acknowledged();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(enabled, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.heading("Crypto Reddit Advisor");
                        if ui.button("Home").clicked() {
                            self.go_home();
                        }
                    });
                    ui.add_space(10.0);
                    self.form(ui);
                    ui.add_space(10.0);
                    self.results(ui);
                });
            });
        });
    }
}

impl CraApp {
    fn form(&mut self, ui: &mut egui::Ui) {
        let loading = self.client.state().is_loading();
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label("Cryptocurrency:");
                let resp = ui
                    .text_edit_singleline(&mut self.topic)
                    .on_hover_text("e.g. Bitcoin, Ethereum, Solana");
                if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) && !loading {
                    self.start_search();
                }
            });
            ui.horizontal(|ui| {
                ui.label("Posts:");
                ui.add(egui::TextEdit::singleline(&mut self.max_results).desired_width(50.0));
                ui.label("Min upvotes:");
                ui.add(egui::TextEdit::singleline(&mut self.min_upvotes).desired_width(70.0));
            });
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!loading, egui::Button::new("Get Advice"))
                    .clicked()
                {
                    self.start_search();
                }
                if loading {
                    ui.spinner();
                    ui.label("Searching...");
                }
            });
        });

        if !self.form_error.is_empty() {
            ui.colored_label(egui::Color32::RED, &self.form_error);
        }
        if !self.status_message.is_empty() {
            ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
        }
    }

    fn results(&mut self, ui: &mut egui::Ui) {
        let payload = match self.client.state() {
            SearchState::Failed { message, .. } => {
                ui.colored_label(egui::Color32::RED, message);
                return;
            }
            SearchState::Success { payload, .. } => payload.clone(),
            SearchState::Idle | SearchState::Loading { .. } => return,
        };
        let Some(view) = self.view.clone() else {
            return;
        };
        let topic = self
            .client
            .state()
            .query()
            .map(|q| q.topic().to_string())
            .unwrap_or_default();

        if view.display_posts.is_empty() {
            ui.label(format!("No posts found about {topic}."));
            return;
        }

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Total upvotes: {}", fmt_count(view.total_upvotes)));
                ui.separator();
                ui.label(format!("Total comments: {}", fmt_count(view.total_comments)));
                ui.separator();
                ui.label(format!("Results: {}", payload.total_results));
            });
            ui.add_space(5.0);
            ui.label("Top posts by upvotes");
            let max = view
                .chart_series
                .iter()
                .map(|p| p.value)
                .max()
                .unwrap_or(0)
                .max(1);
            for p in &view.chart_series {
                ui.horizontal(|ui| {
                    ui.label(&p.label);
                    ui.add(
                        egui::ProgressBar::new(p.value as f32 / max as f32)
                            .desired_width(300.0)
                            .text(fmt_count(p.value)),
                    )
                    .on_hover_text(&p.tooltip_title);
                });
            }
        });

        ui.add_space(5.0);
        ui.horizontal(|ui| {
            if ui.button("Export CSV").clicked() {
                self.export(&payload, ExportKind::Csv);
            }
            if ui.button("Export JSON").clicked() {
                self.export(&payload, ExportKind::Json);
            }
            if ui.button("Save chart").clicked() {
                self.export(&payload, ExportKind::Chart);
            }
        });

        ui.add_space(10.0);
        ui.heading(format!("Top posts about {topic}"));
        for (idx, post) in view.display_posts.iter().enumerate() {
            ui.group(|ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.strong(format!("#{}", idx + 1));
                    if post.url.is_empty() {
                        ui.label(&post.title);
                    } else {
                        ui.hyperlink_to(&post.title, &post.url);
                    }
                });
                let flair = post
                    .flair
                    .as_deref()
                    .map(|f| format!(" • {f}"))
                    .unwrap_or_default();
                ui.weak(format!(
                    "r/{} • u/{}{} • {} upvotes • {} comments",
                    post.subreddit,
                    post.author,
                    flair,
                    fmt_count(post.upvotes),
                    fmt_count(post.num_comments)
                ));
                if !post.text.trim().is_empty() {
                    ui.label(&post.text);
                }
            });
        }
    }
}
