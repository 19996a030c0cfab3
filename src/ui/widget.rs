//! egui surface for a [`Vs30View`] on the built-in [`Map`].
//!
//! Tiles are fetched by a background [`TileLoader`], kept as raw bytes in a
//! [`TileCache`] and uploaded to textures on first draw. Markers, clusters,
//! the open popup and the controls are painted on top every frame.

use crate::{
    core::{
        config::ViewConfig,
        constants::TILE_SIZE,
        geo::Point,
        map::{ClickTarget, Map, MapProvider, CLUSTER_ICON_RADIUS},
    },
    layers::{marker::CircleMarker, tile::BaseLayer},
    spatial::clustering::Cluster,
    tiles::{cache::TileCache, loader::TileLoader, source::TileSource},
    ui::controls::ScaleLine,
    view::Vs30View,
};
use egui::{
    Align2, Color32, ColorImage, CursorIcon, FontId, Pos2, Rect, Response, Sense, Stroke,
    TextureHandle, TextureOptions, Ui, Vec2,
};
use fxhash::FxHashSet;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;

const BACKGROUND: Color32 = Color32::from_rgb(221, 221, 221);

/// Stateful painter for the map and table regions of one view
pub struct MapPanel {
    loader: Option<TileLoader>,
    cache: TileCache,
    textures: LruCache<String, TextureHandle>,
    pending: FxHashSet<String>,
    id: egui::Id,
}

impl MapPanel {
    pub fn new(config: &ViewConfig) -> Self {
        let loader = match TileLoader::new() {
            Ok(loader) => Some(loader),
            Err(e) => {
                log::warn!("tile loading disabled: {}", e);
                None
            }
        };
        let capacity = NonZeroUsize::new(config.tile_cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            loader,
            cache: TileCache::new(config.tile_cache_size),
            textures: LruCache::new(capacity),
            pending: FxHashSet::default(),
            id: egui::Id::new("vs30-map-panel"),
        }
    }

    pub fn with_id(mut self, id: impl std::hash::Hash) -> Self {
        self.id = egui::Id::new(id);
        self
    }

    /// Paints the map region into the available space and handles input
    pub fn show_map(&mut self, ui: &mut Ui, view: &Vs30View<Map>) -> Response {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.receive_tiles();

        view.with_map_mut(|map| {
            map.set_size(Point::new(rect.width() as f64, rect.height() as f64));
            self.handle_input(ui, &response, rect, map);

            let painter = ui.painter_at(rect);
            painter.rect_filled(rect, 0.0, BACKGROUND);
            if let Some(base) = map.active_base_layer().cloned() {
                self.paint_tiles(ui.ctx(), &painter, rect, map, &base);
            }
            let clusters = map.clusters();
            paint_markers(&painter, rect, map, &clusters);
            if let Some(scale) = map.scale() {
                paint_scale(&painter, rect, scale.metric.as_ref(), scale.imperial.as_ref());
            }
            paint_attribution(&painter, rect, &map.attribution());

            self.show_layer_switcher(ui.ctx(), rect, map);
            self.show_popup(ui.ctx(), rect, map);
        });

        if !self.pending.is_empty() {
            ui.ctx().request_repaint_after(Duration::from_millis(100));
        }
        response
    }

    /// Paints the station table; headers are sort buttons
    pub fn show_table(&mut self, ui: &mut Ui, view: &Vs30View<Map>) {
        view.with_table_mut(|table| {
            let headers: Vec<(String, String)> = table
                .sorts()
                .iter()
                .map(|sort| (sort.id.clone(), sort.title.clone()))
                .collect();
            let selected = table.selected_sort().map(|sort| sort.id.clone());
            let descending = table.is_descending();
            let rows = table.rows();

            egui::ScrollArea::vertical()
                .id_source(self.id.with("table"))
                .show(ui, |ui| {
                    egui::Grid::new(self.id.with("grid"))
                        .striped(true)
                        .num_columns(headers.len())
                        .show(ui, |ui| {
                            let mut clicked = None;
                            for (id, title) in &headers {
                                let marker = match (&selected, descending) {
                                    (Some(current), false) if current == id => " ^",
                                    (Some(current), true) if current == id => " v",
                                    _ => "",
                                };
                                if ui.button(format!("{title}{marker}")).clicked() {
                                    clicked = Some(id.clone());
                                }
                            }
                            ui.end_row();

                            for row in &rows {
                                for cell in row {
                                    ui.label(cell);
                                }
                                ui.end_row();
                            }

                            if let Some(id) = clicked {
                                if let Err(e) = table.select_sort(&id) {
                                    log::warn!("{}", e);
                                }
                            }
                        });
                });
        });
    }

    fn receive_tiles(&mut self) {
        let Some(loader) = &self.loader else {
            return;
        };
        for tile in loader.poll() {
            self.pending.remove(&tile.url);
            self.cache.insert(tile.url, tile.data);
        }
    }

    fn handle_input(&self, ui: &Ui, response: &Response, rect: Rect, map: &mut Map) {
        let to_map = |pos: Pos2| Point::new((pos.x - rect.min.x) as f64, (pos.y - rect.min.y) as f64);

        if response.dragged() && map.options().dragging {
            let delta = response.drag_delta();
            map.pan(Point::new(-delta.x as f64, -delta.y as f64));
            ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
        }

        if response.hovered() && map.options().scroll_wheel_zoom {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.1 {
                let focus = response.hover_pos().map(to_map);
                if scroll > 0.0 {
                    map.zoom_in(focus);
                } else {
                    map.zoom_out(focus);
                }
            }
        }

        if response.double_clicked() && map.options().double_click_zoom {
            map.zoom_in(response.interact_pointer_pos().map(to_map));
        } else if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                match map.click(&to_map(pos)) {
                    Ok(ClickTarget::Cluster(id)) => log::debug!("zoomed into cluster {}", id),
                    Ok(_) => {}
                    Err(e) => log::warn!("click failed: {}", e),
                }
            }
        }
    }

    fn paint_tiles(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        rect: Rect,
        map: &Map,
        base: &BaseLayer,
    ) {
        let viewport = map.viewport();
        for layer in base.layers() {
            for (coord, corner) in layer.visible_tiles(viewport) {
                let url = layer.url(coord);
                let size = TILE_SIZE as f64 * 2_f64.powf(viewport.zoom - coord.z as f64);
                let tile_rect = Rect::from_min_size(
                    rect.min + Vec2::new(corner.x as f32, corner.y as f32),
                    Vec2::splat(size as f32),
                );
                if let Some(texture) = self.texture(ctx, &url) {
                    painter.image(
                        texture.id(),
                        tile_rect,
                        Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
            }
        }
    }

    /// Texture for a tile URL, decoding cached bytes or starting a download
    fn texture(&mut self, ctx: &egui::Context, url: &str) -> Option<TextureHandle> {
        if let Some(texture) = self.textures.get(url) {
            return Some(texture.clone());
        }

        if let Some(bytes) = self.cache.get(url) {
            let image = decode_image(&bytes)?;
            let texture = ctx.load_texture(url, image, TextureOptions::LINEAR);
            self.textures.put(url.to_string(), texture.clone());
            return Some(texture);
        }

        if let Some(loader) = &self.loader {
            if self.pending.insert(url.to_string()) {
                loader.start_download(url.to_string());
            }
        }
        None
    }

    fn show_layer_switcher(&self, ctx: &egui::Context, rect: Rect, map: &mut Map) {
        let names: Vec<String> = map.base_layers().iter().map(|l| l.name().to_string()).collect();
        if names.is_empty() {
            return;
        }
        let active = map.active_base_layer().map(|l| l.name().to_string());

        egui::Area::new(self.id.with("layers"))
            .fixed_pos(rect.right_top() + Vec2::new(-120.0, 10.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    for name in &names {
                        let checked = active.as_deref() == Some(name.as_str());
                        if ui.radio(checked, name.as_str()).clicked() && !checked {
                            if let Err(e) = map.select_base_layer(name) {
                                log::warn!("{}", e);
                            }
                        }
                    }
                });
            });
    }

    fn show_popup(&self, ctx: &egui::Context, rect: Rect, map: &mut Map) {
        let Some((marker, popup)) = map.open_popup() else {
            return;
        };
        let anchor = map.viewport().lat_lng_to_pixel(&marker.position());
        let pos = rect.min + Vec2::new(anchor.x as f32 + 12.0, anchor.y as f32 - 12.0);
        let popup = popup.clone();

        let mut close = false;
        egui::Area::new(self.id.with("popup"))
            .fixed_pos(pos)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.heading(&popup.heading);
                        close = ui.small_button("x").clicked();
                    });
                    egui::Grid::new(self.id.with("popup-grid")).show(ui, |ui| {
                        for row in &popup.rows {
                            ui.strong(row.label);
                            ui.label(&row.value);
                            ui.end_row();
                        }
                    });
                });
            });

        if close {
            map.close_popup();
        }
    }
}

fn to_screen(rect: Rect, point: Point) -> Pos2 {
    rect.min + Vec2::new(point.x as f32, point.y as f32)
}

fn paint_markers(painter: &egui::Painter, rect: Rect, map: &Map, clusters: &[Cluster]) {
    let viewport = map.viewport();
    let markers = map.markers();

    for cluster in clusters {
        if cluster.is_single() {
            let marker = &markers[cluster.members[0]];
            let center = to_screen(rect, viewport.lat_lng_to_pixel(&marker.position()));
            let (fill, stroke) = marker_paint(marker);
            painter.circle(center, marker.style().radius as f32, fill, stroke);
        } else {
            let center = to_screen(rect, viewport.lat_lng_to_pixel(&cluster.center));
            let (outer, inner) = cluster_colors(cluster.count());
            painter.circle_filled(center, CLUSTER_ICON_RADIUS as f32, outer);
            painter.circle_filled(center, CLUSTER_ICON_RADIUS as f32 - 5.0, inner);
            painter.text(
                center,
                Align2::CENTER_CENTER,
                cluster.count().to_string(),
                FontId::proportional(12.0),
                Color32::BLACK,
            );
        }
    }
}

/// Fill and stroke of a station circle; both take the marker's colour
fn marker_paint(marker: &CircleMarker) -> (Color32, Stroke) {
    let [r, g, b] = marker.rgb();
    let style = marker.style();
    let fill = Color32::from_rgba_unmultiplied(r, g, b, (style.fill_opacity * 255.0).round() as u8);
    let stroke = Color32::from_rgba_unmultiplied(r, g, b, (style.opacity * 255.0).round() as u8);
    (fill, Stroke::new(style.weight as f32, stroke))
}

/// Small, medium and large cluster colours
fn cluster_colors(count: usize) -> (Color32, Color32) {
    match count {
        0..=9 => (
            Color32::from_rgba_unmultiplied(181, 226, 140, 153),
            Color32::from_rgba_unmultiplied(110, 204, 57, 153),
        ),
        10..=99 => (
            Color32::from_rgba_unmultiplied(241, 211, 87, 153),
            Color32::from_rgba_unmultiplied(240, 194, 12, 153),
        ),
        _ => (
            Color32::from_rgba_unmultiplied(253, 156, 115, 153),
            Color32::from_rgba_unmultiplied(241, 128, 23, 153),
        ),
    }
}

fn paint_scale(painter: &egui::Painter, rect: Rect, metric: Option<&ScaleLine>, imperial: Option<&ScaleLine>) {
    let stroke = Stroke::new(2.0, Color32::from_gray(60));
    let mut y = rect.left_bottom().y - 40.0;
    for line in [metric, imperial].into_iter().flatten() {
        let start = Pos2::new(rect.min.x + 10.0, y);
        let end = Pos2::new(start.x + line.width as f32, y);
        painter.line_segment([start, end], stroke);
        painter.line_segment([start, start - Vec2::new(0.0, 6.0)], stroke);
        painter.line_segment([end, end - Vec2::new(0.0, 6.0)], stroke);
        painter.text(
            start + Vec2::new(2.0, -4.0),
            Align2::LEFT_BOTTOM,
            &line.label,
            FontId::proportional(10.0),
            Color32::from_gray(40),
        );
        y += 16.0;
    }
}

fn paint_attribution(painter: &egui::Painter, rect: Rect, attribution: &[&str]) {
    if attribution.is_empty() {
        return;
    }
    let text = attribution
        .iter()
        .map(|a| plain_text(a))
        .collect::<Vec<_>>()
        .join(" | ");
    painter.text(
        rect.right_bottom() - Vec2::new(4.0, 2.0),
        Align2::RIGHT_BOTTOM,
        text,
        FontId::proportional(10.0),
        Color32::from_gray(80),
    );
}

/// Strips tags and decodes the few entities attributions use
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&copy;", "©")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn decode_image(bytes: &[u8]) -> Option<ColorImage> {
    let image = image::load_from_memory(bytes).ok()?;
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
