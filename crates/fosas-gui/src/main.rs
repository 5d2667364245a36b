use std::time::{Duration, Instant};

use fosas_core::api::ContentClient;
use fosas_core::filter::{filter_records, unique_hosts, FilterState};
use fosas_core::record::Fosa;
use iced::widget::{
    button, column, container, image, pick_list, responsive, row, scrollable, text, text_input,
};
use iced::{Element, Length, Subscription, Task, Theme};

mod map;
mod style;
use map::{ImageCache, MapView, TileManager};

/// Initial camera: center of Mexico at country-wide zoom.
const INITIAL_CENTER: (f64, f64) = (23.6345, -102.5528);
const INITIAL_ZOOM: f64 = 5.0;
/// Zoom the camera flies to when a record is focused.
const FOCUS_ZOOM: f64 = 12.0;
const FLY_DURATION: Duration = Duration::from_millis(800);

/// Below this window width the layout collapses to map-over-list.
const COMPACT_WIDTH: f32 = 700.0;
/// Fixed card height + list spacing; keeps scroll-to-selection a simple stride.
const CARD_HEIGHT: f32 = 140.0;
const CARD_SPACING: f32 = 10.0;

const ALL_HOSTS: &str = "Todos los colectivos";

fn main() -> iced::Result {
    let _ = simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    iced::application("Fosas Map", App::update, App::view)
        .theme(|_| Theme::Dark)
        .subscription(App::subscription)
        .run_with(App::new)
}

#[derive(Debug, Clone)]
enum Message {
    FosasLoaded(Result<Vec<Fosa>, String>),
    Refresh,

    // Filter inputs
    SearchChanged(String),
    HostSelected(String),

    // Selection & focus
    SelectFosa(String),
    HoverFosa(Option<String>),
    FocusFosa(String),
    OpenOriginal(String),

    // Map camera
    MapZoom {
        new_center: (f64, f64),
        new_zoom: f64,
    },
    FlyTick,

    // Compact layout
    ToggleSidebar,
}

/// Camera animation from one center/zoom to another, driven by a timer
/// subscription that only runs while a flight is active.
struct Flight {
    from_center: (f64, f64),
    from_zoom: f64,
    to_center: (f64, f64),
    to_zoom: f64,
    started: Instant,
}

struct App {
    fosas: Vec<Fosa>,
    filter: FilterState,
    status: String,

    selected: Option<String>,
    hovered: Option<String>,

    // Map state
    tile_manager: TileManager,
    thumbnails: ImageCache,
    map_center: (f64, f64),
    map_zoom: f64,
    flight: Option<Flight>,

    // Sidebar
    sidebar_expanded: bool,
    list_scroll_id: scrollable::Id,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        let app = Self {
            fosas: Vec::new(),
            filter: FilterState::default(),
            status: "Cargando...".to_string(),
            selected: None,
            hovered: None,
            tile_manager: TileManager::new(),
            thumbnails: ImageCache::new(100),
            map_center: INITIAL_CENTER,
            map_zoom: INITIAL_ZOOM,
            flight: None,
            sidebar_expanded: false,
            list_scroll_id: scrollable::Id::unique(),
        };

        (app, load_fosas_task())
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::FosasLoaded(result) => {
                match result {
                    Ok(fosas) => {
                        self.fosas = fosas;
                        self.status = format!("{} fosas documentadas", self.fosas.len());
                    }
                    Err(e) => {
                        // A failed summary fetch leaves the set empty; only
                        // the status line notes it.
                        log::warn!("load failed: {}", e);
                        self.status = format!("Error al cargar: {}", e);
                    }
                }
                Task::none()
            }
            Message::Refresh => {
                self.status = "Cargando...".to_string();
                load_fosas_task()
            }
            Message::SearchChanged(raw) => {
                self.filter.set_search(&raw);
                Task::none()
            }
            Message::HostSelected(choice) => {
                self.filter.host = (choice != ALL_HOSTS).then_some(choice);
                Task::none()
            }
            Message::SelectFosa(key) => {
                self.selected = Some(key.clone());
                let visible = filter_records(&self.fosas, &self.filter);
                if let Some(index) = visible.iter().position(|f| f.key() == key) {
                    let offset = index as f32 * (CARD_HEIGHT + CARD_SPACING);
                    return scrollable::scroll_to(
                        self.list_scroll_id.clone(),
                        scrollable::AbsoluteOffset { x: 0.0, y: offset },
                    );
                }
                Task::none()
            }
            Message::HoverFosa(key_opt) => {
                if self.hovered != key_opt {
                    self.hovered = key_opt;
                }
                Task::none()
            }
            Message::FocusFosa(key) => {
                self.selected = Some(key.clone());

                let coordinate = self
                    .fosas
                    .iter()
                    .find(|f| f.key() == key)
                    .and_then(|f| f.coordinate());

                if let Some(target) = coordinate {
                    self.flight = Some(Flight {
                        from_center: self.map_center,
                        from_zoom: self.map_zoom,
                        to_center: target,
                        to_zoom: FOCUS_ZOOM,
                        started: Instant::now(),
                    });
                }

                // On compact layouts the expanded panel folds back down and
                // the list returns to the top. The toggle only exists there,
                // so the flag doubles as the layout check.
                if self.sidebar_expanded {
                    self.sidebar_expanded = false;
                    return scrollable::scroll_to(
                        self.list_scroll_id.clone(),
                        scrollable::AbsoluteOffset { x: 0.0, y: 0.0 },
                    );
                }
                Task::none()
            }
            Message::OpenOriginal(key) => {
                if let Some(fosa) = self.fosas.iter().find(|f| f.key() == key) {
                    let url = fosa.permalink();
                    if let Err(e) = open::that(&url) {
                        log::warn!("could not open {}: {}", url, e);
                    }
                }
                Task::done(Message::FocusFosa(key))
            }
            Message::MapZoom {
                new_center,
                new_zoom,
            } => {
                // Manual interaction cancels any in-flight camera animation.
                self.flight = None;
                self.map_center = new_center;
                self.map_zoom = new_zoom;
                Task::none()
            }
            Message::FlyTick => {
                if let Some(flight) = &self.flight {
                    let t = flight.started.elapsed().as_secs_f64()
                        / FLY_DURATION.as_secs_f64();
                    if t >= 1.0 {
                        self.map_center = flight.to_center;
                        self.map_zoom = flight.to_zoom;
                        self.flight = None;
                    } else {
                        let ease = t * t * (3.0 - 2.0 * t);
                        self.map_center = (
                            flight.from_center.0
                                + (flight.to_center.0 - flight.from_center.0) * ease,
                            flight.from_center.1
                                + (flight.to_center.1 - flight.from_center.1) * ease,
                        );
                        self.map_zoom =
                            flight.from_zoom + (flight.to_zoom - flight.from_zoom) * ease;
                    }
                }
                Task::none()
            }
            Message::ToggleSidebar => {
                self.sidebar_expanded = !self.sidebar_expanded;
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.flight.is_some() {
            iced::time::every(Duration::from_millis(16)).map(|_| Message::FlyTick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<'_, Message> {
        responsive(move |size| {
            let compact = size.width < COMPACT_WIDTH;

            if compact {
                let (map_portion, sidebar_portion) = if self.sidebar_expanded {
                    (1, 3)
                } else {
                    (2, 1)
                };

                column![
                    container(self.view_map())
                        .width(Length::Fill)
                        .height(Length::FillPortion(map_portion)),
                    container(self.view_sidebar(true))
                        .width(Length::Fill)
                        .height(Length::FillPortion(sidebar_portion))
                        .style(style::container_sidebar)
                        .padding(10),
                ]
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
            } else {
                row![
                    container(self.view_sidebar(false))
                        .width(Length::Fixed(380.0))
                        .height(Length::Fill)
                        .style(style::container_sidebar)
                        .padding(10),
                    column![
                        self.view_map(),
                        container(self.view_detail_panel())
                            .width(Length::Fill)
                            .height(Length::Fixed(180.0))
                            .style(style::container_card)
                            .padding(15),
                    ]
                    .spacing(10)
                    .padding(10),
                ]
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
            }
        })
        .into()
    }

    fn view_map(&self) -> Element<'_, Message> {
        let visible = filter_records(&self.fosas, &self.filter);

        container(responsive(move |size| {
            // Never zoom out past a single world-width of tiles.
            let zoom = self
                .map_zoom
                .max((size.width as f64 / map::TILE_SIZE).log2());

            let map_view = MapView {
                fosas: visible.clone(),
                selected: self.selected.as_ref(),
                hovered: self.hovered.as_ref(),
                tile_manager: &self.tile_manager,
                zoom,
                center: self.map_center,
            };

            map_view.into()
        }))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(style::container_card)
        .padding(1)
        .clip(true)
        .into()
    }

    fn view_sidebar(&self, compact: bool) -> Element<'_, Message> {
        let visible = filter_records(&self.fosas, &self.filter);

        let search = text_input(
            "Buscar por zonas, descripción o colectivo",
            &self.filter.search,
        )
        .on_input(Message::SearchChanged)
        .padding(8)
        .size(14);

        let mut host_options = vec![ALL_HOSTS.to_string()];
        host_options.extend(unique_hosts(&self.fosas));
        let selected_host = self
            .filter
            .host
            .clone()
            .unwrap_or_else(|| ALL_HOSTS.to_string());

        let host_select = pick_list(host_options, Some(selected_host), Message::HostSelected)
            .padding(8)
            .text_size(14)
            .width(Length::Fill);

        let list = column(
            visible
                .into_iter()
                .map(|fosa| self.view_fosa_card(fosa))
                .collect::<Vec<_>>(),
        )
        .spacing(CARD_SPACING);

        let list_container = scrollable(list)
            .id(self.list_scroll_id.clone())
            .height(Length::Fill);

        let mut content = iced::widget::Column::new().spacing(10);

        if compact {
            let toggle = button(
                text(if self.sidebar_expanded {
                    "Reducir"
                } else {
                    "Expandir"
                })
                .size(12),
            )
            .on_press(Message::ToggleSidebar)
            .style(style::button_secondary)
            .padding([6, 12])
            .width(Length::Fill);
            content = content.push(toggle);

            if let Some(detail) = self.selected_fosa() {
                content = content.push(
                    container(self.view_detail_card(detail))
                        .width(Length::Fill)
                        .style(style::container_card)
                        .padding(10),
                );
            }
        }

        let status_bar = row![
            text(&self.status)
                .size(12)
                .color(style::palette::TEXT_SECONDARY)
                .width(Length::Fill),
            button(text("Actualizar").size(12))
                .on_press(Message::Refresh)
                .style(style::button_secondary)
                .padding([4, 8]),
        ]
        .spacing(10)
        .align_y(iced::Alignment::Center);

        content = content
            .push(search)
            .push(host_select)
            .push(list_container)
            .push(status_bar);

        content.into()
    }

    fn selected_fosa(&self) -> Option<&Fosa> {
        let key = self.selected.as_ref()?;
        self.fosas.iter().find(|f| &f.key() == key)
    }

    /// Popup summary for the selected marker, next to the map on wide
    /// layouts.
    fn view_detail_panel(&self) -> Element<'_, Message> {
        match self.selected_fosa() {
            Some(fosa) => self.view_detail_card(fosa),
            None => column![
                text("Fosas documentadas").size(18),
                text("Selecciona un punto en el mapa o un registro de la lista.")
                    .size(12)
                    .color(style::palette::TEXT_SECONDARY),
            ]
            .spacing(10)
            .into(),
        }
    }

    fn view_detail_card<'a>(&self, fosa: &'a Fosa) -> Element<'a, Message> {
        let description = fosa
            .meta
            .descripcion
            .as_deref()
            .unwrap_or("Sin descripción disponible");

        column![
            text(&fosa.title).size(16),
            text(description)
                .size(12)
                .color(style::palette::TEXT_PRIMARY),
            text(format!("Colectivo autor: {}", fosa.host))
                .size(12)
                .color(style::palette::TEXT_SECONDARY),
            text(format!("Fecha: {}", fosa.formatted_date()))
                .size(12)
                .color(style::palette::TEXT_SECONDARY),
            text(format!("Zonas: {}", fosa.zonas()))
                .size(12)
                .color(style::palette::TEXT_SECONDARY),
            button(text("Ver más detalles").size(12))
                .on_press(Message::OpenOriginal(fosa.key()))
                .style(style::button_primary)
                .padding([6, 12]),
        ]
        .spacing(6)
        .into()
    }

    fn view_fosa_card<'a>(&'a self, fosa: &'a Fosa) -> Element<'a, Message> {
        let key = fosa.key();
        let is_selected = self.selected.as_deref() == Some(key.as_str());

        let thumbnail: Element<'_, Message> = match fosa.image_url() {
            Some(url) => {
                if let Some(handle) = self.thumbnails.get(url) {
                    image(handle)
                        .width(Length::Fixed(90.0))
                        .height(Length::Fill)
                        .into()
                } else {
                    self.thumbnails.request(url);
                    container(iced::widget::Space::new(
                        Length::Fixed(90.0),
                        Length::Fill,
                    ))
                    .style(style::container_card)
                    .into()
                }
            }
            None => container(iced::widget::Space::new(
                Length::Fixed(90.0),
                Length::Fill,
            ))
            .style(style::container_card)
            .into(),
        };

        let coords_line = match fosa.coordinate() {
            Some((lat, lon)) => format!("Lat {:.4}  Lon {:.4}", lat, lon),
            None => "Sin coordenadas".to_string(),
        };

        let title_btn = button(text(&fosa.title).size(14))
            .on_press(Message::FocusFosa(key.clone()))
            .style(style::button_ghost)
            .padding(0);

        let link_btn = button(
            text("Ver post original")
                .size(11)
                .color(style::palette::ACCENT),
        )
        .on_press(Message::OpenOriginal(key.clone()))
        .style(style::button_ghost)
        .padding(0);

        let info = column![
            title_btn,
            text(format!("Colectivo autor: {}", fosa.host))
                .size(11)
                .color(style::palette::TEXT_SECONDARY),
            text(format!("Fecha: {}  ·  {}", fosa.formatted_date(), fosa.slug))
                .size(11)
                .color(style::palette::TEXT_SECONDARY),
            text(format!("Zonas: {}", fosa.zonas()))
                .size(11)
                .color(style::palette::TEXT_SECONDARY),
            text(coords_line)
                .size(11)
                .color(style::palette::TEXT_SECONDARY),
            link_btn,
        ]
        .spacing(4)
        .width(Length::Fill);

        let content_row = row![thumbnail, info]
            .spacing(10)
            .align_y(iced::Alignment::Center);

        button(content_row)
            .on_press(Message::SelectFosa(key))
            .style(move |theme, status| {
                let mut base = style::button_card(theme, status);
                if is_selected {
                    base.border.color = style::palette::ACCENT;
                    base.border.width = 1.0;
                }
                base
            })
            .padding(10)
            .height(Length::Fixed(CARD_HEIGHT))
            .width(Length::Fill)
            .into()
    }
}

fn load_fosas_task() -> Task<Message> {
    Task::perform(
        async {
            let client = ContentClient::default();
            client.load_fosas().await.map_err(|e| e.to_string())
        },
        Message::FosasLoaded,
    )
}
