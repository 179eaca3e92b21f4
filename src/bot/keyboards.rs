//! Inline keyboards of the settings menu

use crate::esios::Zone;
use crate::report::SettingsPage;
use crate::settings::ColorScheme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub callback_data: String,
}

impl Button {
    fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Transport-independent inline keyboard
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

fn back() -> Vec<Button> {
    vec![Button::new("↩ Atras", "keyboard:settings")]
}

fn region(zone: Zone) -> Button {
    Button::new(format!("📍 {}", zone), format!("regions:{}", zone))
}

/// Keyboard shown with a settings page
pub fn keyboard_for(page: SettingsPage) -> Keyboard {
    let rows = match page {
        SettingsPage::Settings | SettingsPage::Subscription => vec![
            vec![Button::new("📰 Cambiar subscripción", "keyboard:subscription")],
            vec![
                Button::new("🗺 Cambiar Región", "keyboard:regions"),
                Button::new("📊 Cambiar colores", "keyboard:colors"),
            ],
        ],
        SettingsPage::Regions => vec![
            vec![region(Zone::Peninsula)],
            vec![region(Zone::Baleares), region(Zone::Canarias)],
            vec![region(Zone::Ceuta), region(Zone::Melilla)],
            back(),
        ],
        SettingsPage::Colors => vec![
            vec![
                Button::new(
                    "📈 Percentiles",
                    format!("colors:{}", ColorScheme::Percentiles),
                ),
                Button::new(
                    "⌛ Tramos reales",
                    format!("colors:{}", ColorScheme::Sections),
                ),
            ],
            back(),
        ],
    };
    Keyboard { rows }
}
