use clap::Parser;
use crossbeam_channel::Receiver;
use std::path::PathBuf;
use vs30_map::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Vs30 station map viewer")]
struct Args {
    /// GeoJSON file or http(s) URL; falls back to the config's `url`
    source: Option<String>,

    /// Map only, no station table
    #[arg(long, default_value_t = false)]
    no_table: bool,

    /// JSON view config
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ViewConfig::from_file(path)?,
        None => ViewConfig::default(),
    };
    if args.no_table {
        config.show_table = false;
    }

    let mut builder = ViewBuilder::new().config(config);
    match args.source {
        Some(source) if is_url(&source) => builder = builder.url(source),
        Some(path) => {
            let body = std::fs::read_to_string(&path)?;
            let features = FeatureCollection::from_body(&body)?.into_features();
            log::info!("read {} station(s) from {}", features.len(), path);
            builder = builder.data(features);
        }
        None => {}
    }
    let view = builder.build_default()?;

    // eframe blocks this thread, so the fetch is spawned before handing over
    let pending = view.source().url().map(|url| {
        log::info!("fetching stations from {}", url);
        spawn_fetch(view.fetcher(), url.to_string())
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Vs30 Stations"),
        ..Default::default()
    };

    eframe::run_native(
        "vs30-map-app",
        options,
        Box::new(move |_cc| Box::new(Vs30App::new(view, pending))),
    )?;

    Ok(())
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

struct Vs30App {
    panel: MapPanel,
    view: Vs30View,
    pending: Option<Receiver<vs30_map::Result<Vec<Feature>>>>,
    status: String,
}

impl Vs30App {
    fn new(view: Vs30View, pending: Option<Receiver<vs30_map::Result<Vec<Feature>>>>) -> Self {
        let status = match &pending {
            Some(_) => "Loading stations...".to_string(),
            None => format!("{} station(s)", view.data().len()),
        };
        Self {
            panel: MapPanel::new(view.config()),
            view,
            pending,
            status,
        }
    }

    fn poll_data(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.pending else {
            return;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.status = match self.view.apply(result) {
                    Ok(count) => format!("{count} station(s)"),
                    Err(e) => format!("Failed to load stations: {e}"),
                };
                self.pending = None;
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {
                ctx.request_repaint_after(std::time::Duration::from_millis(100));
            }
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                log::error!("station fetch ended without a result");
                self.status = "Failed to load stations".to_string();
                self.pending = None;
            }
        }
    }
}

impl eframe::App for Vs30App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_data(ctx);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some((center, zoom)) = self
                        .view
                        .with_map(|map| (map.viewport().center, map.viewport().zoom))
                    {
                        ui.label(format!(
                            "Center: {:.4}, {:.4} | Zoom: {:.0}",
                            center.lat, center.lng, zoom
                        ));
                    }
                });
            });
        });

        if self.view.show_table() {
            egui::SidePanel::right("station_table")
                .resizable(true)
                .default_width(280.0)
                .show(ctx, |ui| {
                    ui.heading("Stations");
                    ui.separator();
                    self.panel.show_table(ui, &self.view);
                });
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.panel.show_map(ui, &self.view);
            });
    }
}
