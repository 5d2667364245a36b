use crate::style::palette;
use crate::Message;
use fosas_core::record::Fosa;
use iced::advanced::{self, layout, renderer, widget, Layout, Widget};
use iced::widget::image;
use iced::{mouse, Color, Element, Event, Length, Radians, Rectangle};
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

// --- Slippy Map / Mercator Math ---
pub const TILE_SIZE: f64 = 256.0;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * TILE_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * TILE_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (TILE_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (TILE_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

// --- Remote image fetching ---

/// URL-keyed cache of decoded image handles, filled by detached fetcher
/// threads. Shared between the tile layer and the sidebar thumbnails.
pub struct ImageCache {
    images: Arc<Mutex<LruCache<String, image::Handle>>>,
    pending: Arc<Mutex<HashSet<String>>>,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            images: Arc::new(Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap(),
            ))),
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn get(&self, url: &str) -> Option<image::Handle> {
        let mut images = self.images.lock().unwrap();
        images.get(url).cloned()
    }

    pub fn request(&self, url: &str) {
        {
            let mut pending = self.pending.lock().unwrap();
            if pending.contains(url) {
                return;
            }
            let images = self.images.lock().unwrap();
            if images.contains(url) {
                return;
            }
            pending.insert(url.to_string());
        }

        let images_arc = Arc::clone(&self.images);
        let pending_arc = Arc::clone(&self.pending);
        let url = url.to_string();

        // Simple background fetcher using std::thread
        std::thread::spawn(move || {
            let resp = ureq::get(&url)
                .set("User-Agent", "fosas-map/0.3")
                .timeout(std::time::Duration::from_secs(10))
                .call();

            match resp {
                Ok(response) => {
                    let mut bytes = Vec::new();
                    if std::io::Read::read_to_end(&mut response.into_reader(), &mut bytes).is_ok() {
                        let handle = image::Handle::from_bytes(bytes);
                        let mut images = images_arc.lock().unwrap();
                        images.put(url.clone(), handle);
                    }
                }
                Err(e) => {
                    log::warn!("failed to fetch {}: {}", url, e);
                }
            }
            let mut pending = pending_arc.lock().unwrap();
            pending.remove(&url);
        });
    }
}

// --- Tile Management ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoords {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl TileCoords {
    pub fn url(&self) -> String {
        format!(
            "https://tile.openstreetmap.org/{}/{}/{}.png",
            self.z, self.x, self.y
        )
    }
}

pub struct TileManager {
    cache: ImageCache,
}

impl TileManager {
    pub fn new() -> Self {
        Self {
            cache: ImageCache::new(300),
        }
    }

    pub fn get_tile(&self, coords: TileCoords) -> Option<image::Handle> {
        self.cache.get(&coords.url())
    }

    pub fn request_tile(&self, coords: TileCoords) {
        self.cache.request(&coords.url());
    }
}

/// One viewport over the filtered record set. Markers are re-derived from
/// `fosas` on every draw; records without a parseable coordinate pair are
/// simply skipped.
pub struct MapView<'a> {
    pub fosas: Vec<&'a Fosa>,
    pub selected: Option<&'a String>,
    pub hovered: Option<&'a String>,
    pub tile_manager: &'a TileManager,
    pub zoom: f64,          // Fractional zoom (e.g. 5.5)
    pub center: (f64, f64), // (Lat, Lon)
}

impl<'a> MapView<'a> {
    fn is_selected(&self, key: &str) -> bool {
        self.selected.map(String::as_str) == Some(key)
    }

    fn is_hovered(&self, key: &str) -> bool {
        self.hovered.map(String::as_str) == Some(key)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MapState {
    is_dragging: bool,
    press_position: Option<iced::Point>,
    last_cursor: Option<iced::Point>,
    // Track values between prop updates to handle multiple events per frame
    current_center: (f64, f64), // (lat, lon)
    current_zoom: f64,
    last_prop_center: Option<(f64, f64)>,
    last_prop_zoom: Option<f64>,
}

impl<'a, Theme, Renderer> Widget<Message, Theme, Renderer> for MapView<'a>
where
    Renderer: renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn size(&self) -> iced::Size<Length> {
        iced::Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn tag(&self) -> widget::tree::Tag {
        widget::tree::Tag::of::<MapState>()
    }

    fn state(&self) -> widget::tree::State {
        widget::tree::State::new(MapState::default())
    }

    fn layout(
        &self,
        _tree: &mut widget::Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(limits.max())
    }

    fn draw(
        &self,
        tree: &widget::Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_ref::<MapState>();
        let bounds = layout.bounds();

        // Prefer internal state for zero-latency feedback during interactions
        let zoom = if state.last_prop_zoom.is_some() {
            state.current_zoom
        } else {
            self.zoom
        };
        let (center_lat, center_lon) = if state.last_prop_center.is_some() {
            state.current_center
        } else {
            self.center
        };

        let zoom_scale = 2.0f64.powf(zoom);

        let camera_center_x = lon_to_x(center_lon, 0.0);
        let camera_center_y = lat_to_y(center_lat, 0.0);

        renderer.with_layer(bounds, |renderer| {
            // Background fill
            renderer.fill_quad(
                renderer::Quad {
                    bounds,
                    border: iced::Border::default(),
                    ..Default::default()
                },
                Color::from_rgb(0.05, 0.05, 0.05),
            );

            // --- Tile Layer ---
            let z = zoom.floor().clamp(0.0, 19.0) as u32;
            let num_tiles = 2u32.pow(z);
            let tile_size_z0 = TILE_SIZE / 2.0f64.powf(z as f64);

            let half_w = (bounds.width as f64 / 2.0) / zoom_scale;
            let half_h = (bounds.height as f64 / 2.0) / zoom_scale;

            let view_left = camera_center_x - half_w;
            let view_right = camera_center_x + half_w;
            let view_top = camera_center_y - half_h;
            let view_bottom = camera_center_y + half_h;

            let min_tx = (view_left / tile_size_z0).floor() as i32;
            let max_tx = (view_right / tile_size_z0).ceil() as i32;
            let min_ty = (view_top / tile_size_z0).floor() as i32;
            let max_ty = (view_bottom / tile_size_z0).ceil() as i32;

            for tx in min_tx..=max_tx {
                if tx < 0 || tx >= num_tiles as i32 {
                    continue;
                }
                for ty in min_ty..=max_ty {
                    if ty < 0 || ty >= num_tiles as i32 {
                        continue;
                    }

                    let coords = TileCoords {
                        x: tx as u32,
                        y: ty as u32,
                        z,
                    };
                    let tile_world_x = tx as f64 * tile_size_z0;
                    let tile_world_y = ty as f64 * tile_size_z0;

                    let screen_x = bounds.x
                        + (bounds.width / 2.0)
                        + ((tile_world_x - camera_center_x) * zoom_scale) as f32;
                    let screen_y = bounds.y
                        + (bounds.height / 2.0)
                        + ((tile_world_y - camera_center_y) * zoom_scale) as f32;
                    let current_tile_size = (tile_size_z0 * zoom_scale) as f32;

                    let tile_rect = Rectangle {
                        x: screen_x,
                        y: screen_y,
                        width: current_tile_size,
                        height: current_tile_size,
                    };

                    if let Some(handle) = self.tile_manager.get_tile(coords) {
                        renderer.draw_image(
                            advanced::image::Image {
                                handle,
                                filter_method: image::FilterMethod::Linear,
                                rotation: Radians(0.0),
                                opacity: 1.0,
                                snap: false,
                            },
                            tile_rect,
                        );
                    } else {
                        renderer.fill_quad(
                            renderer::Quad {
                                bounds: tile_rect,
                                ..Default::default()
                            },
                            Color::from_rgb(0.1, 0.1, 0.1),
                        );
                        self.tile_manager.request_tile(coords);
                    }
                }
            }
        });

        // --- Marker Layer ---
        // Drawn in a separate layer on top so tiles never cover a marker
        renderer.with_layer(bounds, |renderer| {
            let marker_size = 8.0;
            let selected_size = 12.0;

            for fosa in &self.fosas {
                let (lat, lon) = match fosa.coordinate() {
                    Some(coords) => coords,
                    None => continue,
                };

                let key = fosa.key();
                let is_active = self.is_selected(&key) || self.is_hovered(&key);

                let fill_color = if is_active {
                    palette::MARKER_ACTIVE
                } else {
                    palette::MARKER
                };
                let size = if is_active { selected_size } else { marker_size };
                let half_size = size / 2.0;

                let wx = lon_to_x(lon, 0.0);
                let wy = lat_to_y(lat, 0.0);

                let sx = bounds.x
                    + (bounds.width / 2.0)
                    + ((wx - camera_center_x) * zoom_scale) as f32;
                let sy = bounds.y
                    + (bounds.height / 2.0)
                    + ((wy - camera_center_y) * zoom_scale) as f32;

                renderer.fill_quad(
                    renderer::Quad {
                        bounds: Rectangle {
                            x: sx - half_size,
                            y: sy - half_size,
                            width: size,
                            height: size,
                        },
                        border: iced::Border {
                            color: Color::BLACK,
                            width: 1.0,
                            radius: (size / 2.0).into(),
                        },
                        ..Default::default()
                    },
                    fill_color,
                );
            }
        });
    }

    fn on_event(
        &mut self,
        tree: &mut widget::Tree,
        event: Event,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn advanced::Clipboard,
        shell: &mut advanced::Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> advanced::graphics::core::event::Status {
        let state = tree.state.downcast_mut::<MapState>();
        let bounds = layout.bounds();
        let zoom_prop = self.zoom;
        let center_prop = self.center;

        // Initialize or sync internal state from props if props changed externally
        if state.last_prop_center != Some(center_prop) || state.last_prop_zoom != Some(zoom_prop) {
            state.current_center = center_prop;
            state.current_zoom = zoom_prop;
            state.last_prop_center = Some(center_prop);
            state.last_prop_zoom = Some(zoom_prop);
        }

        let current_zoom = state.current_zoom;
        let (center_lat, center_lon) = state.current_center;

        let camera_x = lon_to_x(center_lon, 0.0);
        let camera_y = lat_to_y(center_lat, 0.0);
        let scale = 2.0f64.powf(current_zoom);

        let cursor_point = cursor.position_in(bounds);
        let mouse_z0 = cursor_point.map(|p| {
            let rx = (p.x as f64) - (bounds.width as f64 / 2.0);
            let ry = (p.y as f64) - (bounds.height as f64 / 2.0);
            (camera_x + rx / scale, camera_y + ry / scale)
        });

        // Hit-test in world pixels: 10px screen radius around each marker.
        let hit_fosa = |wx: f64, wy: f64| -> Option<String> {
            for fosa in &self.fosas {
                if let Some((lat, lon)) = fosa.coordinate() {
                    let tx = lon_to_x(lon, 0.0);
                    let ty = lat_to_y(lat, 0.0);
                    let dist_sq = (tx - wx).powi(2) + (ty - wy).powi(2);
                    if dist_sq < (10.0 / scale).powi(2) {
                        return Some(fosa.key());
                    }
                }
            }
            None
        };

        match event {
            Event::Mouse(iced::mouse::Event::WheelScrolled { delta }) => {
                if let Some(p) = cursor_point {
                    let d = match delta {
                        iced::mouse::ScrollDelta::Lines { y, .. } => y as f64,
                        iced::mouse::ScrollDelta::Pixels { y, .. } => (y as f64) / 100.0,
                    };
                    let min_zoom = (bounds.width as f64 / TILE_SIZE).log2();
                    let new_zoom = (current_zoom + d * 0.2).clamp(min_zoom, 19.0);

                    if (new_zoom - current_zoom).abs() > 0.001 {
                        let new_scale = 2.0f64.powf(new_zoom);

                        let mx = (p.x as f64) - (bounds.width as f64 / 2.0);
                        let my = (p.y as f64) - (bounds.height as f64 / 2.0);

                        let new_camera_x = camera_x + mx / scale - mx / new_scale;
                        let new_camera_y = camera_y + my / scale - my / new_scale;

                        let new_half_w = (bounds.width as f64 / 2.0) / new_scale;
                        let new_camera_x_clamped =
                            new_camera_x.clamp(new_half_w, TILE_SIZE - new_half_w);
                        let new_camera_y_clamped = new_camera_y.clamp(0.0, TILE_SIZE);

                        let new_center = (
                            y_to_lat(new_camera_y_clamped, 0.0),
                            x_to_lon(new_camera_x_clamped, 0.0),
                        );

                        // Update internal state immediately for next event in same frame
                        state.current_center = new_center;
                        state.current_zoom = new_zoom;

                        shell.publish(Message::MapZoom {
                            new_center,
                            new_zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(iced::mouse::Event::ButtonPressed(iced::mouse::Button::Left)) => {
                if cursor.is_over(bounds) {
                    if let Some(position) = cursor.position() {
                        state.is_dragging = true;
                        state.press_position = Some(position);
                        state.last_cursor = Some(position);
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(iced::mouse::Event::ButtonReleased(iced::mouse::Button::Left)) => {
                let was_dragging = state.is_dragging;
                let press_pos = state.press_position;
                let release_pos = cursor.position();

                state.is_dragging = false;
                state.press_position = None;
                state.last_cursor = None;

                if was_dragging {
                    // Minimal movement between press and release is a click
                    if let (Some(p1), Some(p2)) = (press_pos, release_pos) {
                        let dist = (p1.x - p2.x).hypot(p1.y - p2.y);
                        if dist < 5.0 {
                            if let Some((wx, wy)) = mouse_z0 {
                                if let Some(key) = hit_fosa(wx, wy) {
                                    shell.publish(Message::SelectFosa(key));
                                    return advanced::graphics::core::event::Status::Captured;
                                }
                            }
                        }
                    }
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            Event::Mouse(iced::mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last_pos) = state.last_cursor {
                        let delta = position - last_pos;
                        state.last_cursor = Some(position);

                        let dx = delta.x as f64 / scale;
                        let dy = delta.y as f64 / scale;

                        // New center in world pixels (zoom 0)
                        let new_wx = camera_x - dx;
                        let new_wy = camera_y - dy;

                        let half_vw = (bounds.width as f64 / 2.0) / scale;
                        let half_vh = (bounds.height as f64 / 2.0) / scale;

                        // Clamp X
                        let clamped_wx = if half_vw * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0 // Center if viewport >= world
                        } else {
                            new_wx.clamp(half_vw, TILE_SIZE - half_vw)
                        };

                        // Clamp Y
                        let clamped_wy = if half_vh * 2.0 >= TILE_SIZE {
                            TILE_SIZE / 2.0
                        } else {
                            new_wy.clamp(half_vh, TILE_SIZE - half_vh)
                        };

                        let new_center = (y_to_lat(clamped_wy, 0.0), x_to_lon(clamped_wx, 0.0));

                        // Update internal state immediately for next event (e.g. multiple moves in one frame)
                        state.current_center = new_center;

                        shell.publish(Message::MapZoom {
                            new_center,
                            new_zoom: current_zoom,
                        });
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }

                if let Some((wx, wy)) = mouse_z0 {
                    let hit = hit_fosa(wx, wy);
                    if hit.is_some() {
                        if self.hovered.map(String::as_str) != hit.as_deref() {
                            shell.publish(Message::HoverFosa(hit));
                        }
                        return advanced::graphics::core::event::Status::Captured;
                    }
                    if self.hovered.is_some() {
                        shell.publish(Message::HoverFosa(None));
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            _ => {}
        }

        advanced::graphics::core::event::Status::Ignored
    }

    fn mouse_interaction(
        &self,
        _tree: &widget::Tree,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        if cursor.is_over(layout.bounds()) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a, Theme, Renderer> From<MapView<'a>> for Element<'a, Message, Theme, Renderer>
where
    Theme: 'a,
    Renderer: 'a + renderer::Renderer + advanced::image::Renderer<Handle = image::Handle>,
{
    fn from(map_view: MapView<'a>) -> Self {
        Self::new(map_view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_round_trip() {
        let (lat, lon) = (23.6345, -102.5528);
        let x = lon_to_x(lon, 5.0);
        let y = lat_to_y(lat, 5.0);
        assert!((x_to_lon(x, 5.0) - lon).abs() < 1e-9);
        assert!((y_to_lat(y, 5.0) - lat).abs() < 1e-9);
    }

    #[test]
    fn test_tile_url() {
        let coords = TileCoords { x: 6, y: 13, z: 5 };
        assert_eq!(coords.url(), "https://tile.openstreetmap.org/5/6/13.png");
    }
}
