use iced::widget::{button, container};
use iced::{Background, Border, Color, Shadow, Theme, Vector};

pub mod palette {
    use iced::Color;

    // Muted near-black chrome; the tiles carry the color, the surfaces
    // around them stay back.
    pub const BACKGROUND: Color = Color::from_rgb(0.09, 0.09, 0.11);
    pub const SURFACE: Color = Color::from_rgb(0.14, 0.14, 0.17);
    pub const SURFACE_HOVER: Color = Color::from_rgb(0.20, 0.20, 0.24);
    pub const BORDER: Color = Color::from_rgb(0.27, 0.27, 0.32);

    pub const TEXT_PRIMARY: Color = Color::from_rgb(0.92, 0.91, 0.88);
    pub const TEXT_SECONDARY: Color = Color::from_rgb(0.60, 0.59, 0.57);

    /// Marker fill, shared with the map layer so list accents match the pins.
    pub const MARKER: Color = Color::from_rgb(0.85, 0.2, 0.2);
    /// Fill for the marker under the cursor or currently selected.
    pub const MARKER_ACTIVE: Color = Color::from_rgb(1.0, 0.84, 0.25);
    /// Links and selection borders; a warmer cousin of the marker red.
    pub const ACCENT: Color = Color::from_rgb(0.91, 0.49, 0.36);
}

fn edge(color: Color, radius: f32) -> Border {
    Border {
        color,
        width: 1.0,
        radius: radius.into(),
    }
}

pub fn container_sidebar(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::BACKGROUND)),
        border: edge(palette::BORDER, 0.0),
        ..Default::default()
    }
}

/// Record cards, the detail panel, and the map frame share one raised
/// surface.
pub fn container_card(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::SURFACE)),
        border: edge(palette::BORDER, 5.0),
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.45),
            offset: Vector::new(0.0, 3.0),
            blur_radius: 9.0,
        },
        ..Default::default()
    }
}

/// Filled call-to-action ("Ver más detalles").
pub fn button_primary(_theme: &Theme, status: button::Status) -> button::Style {
    let fill = match status {
        button::Status::Hovered => Color::from_rgb(0.96, 0.58, 0.45),
        _ => palette::ACCENT,
    };

    button::Style {
        background: Some(Background::Color(fill)),
        text_color: Color::from_rgb(0.10, 0.07, 0.06),
        border: edge(Color::TRANSPARENT, 5.0),
        shadow: Shadow::default(),
    }
}

/// Outlined chrome buttons: the refresh control and the compact toggle.
pub fn button_secondary(_theme: &Theme, status: button::Status) -> button::Style {
    let fill = match status {
        button::Status::Hovered => palette::SURFACE_HOVER,
        _ => palette::SURFACE,
    };

    button::Style {
        background: Some(Background::Color(fill)),
        text_color: palette::TEXT_PRIMARY,
        border: edge(palette::BORDER, 5.0),
        shadow: Shadow::default(),
    }
}

/// Bare text buttons: record titles and outbound links.
pub fn button_ghost(_theme: &Theme, status: button::Status) -> button::Style {
    let text_color = match status {
        button::Status::Hovered | button::Status::Pressed => palette::ACCENT,
        _ => palette::TEXT_PRIMARY,
    };

    button::Style {
        background: None,
        text_color,
        border: Border::default(),
        shadow: Shadow::default(),
    }
}

/// A whole list row is one button; hover and press light the border up in
/// the accent, matching the selected-row highlight applied in the list view.
pub fn button_card(_theme: &Theme, status: button::Status) -> button::Style {
    let border = match status {
        button::Status::Hovered | button::Status::Pressed => edge(palette::ACCENT, 5.0),
        _ => edge(palette::BORDER, 5.0),
    };

    button::Style {
        background: Some(Background::Color(palette::SURFACE)),
        text_color: palette::TEXT_PRIMARY,
        border,
        shadow: Shadow::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_hover_matches_selection_accent() {
        let hovered = button_card(&Theme::Dark, button::Status::Hovered);
        assert_eq!(hovered.border.color, palette::ACCENT);

        let resting = button_card(&Theme::Dark, button::Status::Active);
        assert_eq!(resting.border.color, palette::BORDER);
    }

    #[test]
    fn test_marker_states_are_distinct() {
        assert_ne!(palette::MARKER, palette::MARKER_ACTIVE);
    }
}
