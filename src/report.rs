//! Chat message formatting
//!
//! All user-facing texts are Spanish HTML (Telegram `ParseMode::Html`).

use chrono::{Datelike, Duration, NaiveDate};

use crate::analysis::{DailySeries, PriceBand, PricePoint, PriceWindow, Summary, TariffSection};
use crate::error::{PvpcError, Result};
use crate::settings::{ColorScheme, UserSettings};

/// Generic reply when a price request fails
pub const DATA_UNAVAILABLE: &str = "Datos no disponibles, inténtalo mas tarde.";

/// Reply when an admin command has a malformed argument
pub const SOMETHING_WENT_WRONG: &str = "Algo ha salido mal, inténtalo de nuevo.";

pub const HELP_MESSAGE: &str = "
    <u><b>💻 Lista de comandos:</b></u>

    ⚙ <i>/ajustes</i>
        Para cambiar los ajustes (localización, colores de las gráficas, apagar las notificaciones diarias...)

    ❓ <i>/ayuda</i>
        Muestra este menú de ayuda

    📊 <i>/precios</i>
        Muestra los precios del día desglosados por horas, junto con una gráfica y un breve resumen estadístico.

        ℹ Si quieres ver los precios de un día específico puedes poner <i>/precios DD/MM/AAAA</i>

    📊 <i>/siguientes</i>
        Muestra los precios del día siguiente desglosados por horas, junto con una gráfica y un breve resumen estadístico.

    📊 <i>/analisis</i>
        Te devuelve la lista de precios del día ordenados de más barato a más caro

        ℹ Si quieres ver la lista de precios del día ordenados de un día específico puedes poner <i>/analisis DD/MM/AAAA</i>

        ℹ Si quieres calcular los tramos de X horas seguidas que son más baratos a lo largo del día puedes poner <i>/analisis X</i>

        ℹ Puedes combinar ambas opciones y poner <i>/analisis X DD/MM/AAAA</i> o <i>/analisis DD/MM/AAAA X</i> para saber los conjuntos de X horas más baratas del dia seleccionado.
    ";

/// Welcome text for `/start`, addressed as the bot's username
pub fn welcome_message(username: &str) -> String {
    format!(
        "
    👋 Bienvenido a {} !!

    Aquí encontraras todos los días los precios de la luz desglosados por horas, tramos horarios; con gráficas y análisis estadísticos básicos.

    💡 También podrás pedir que te calcule los tramos de varias horas seguidas que son más baratos, por si quieres conectar algún dispositivo en concreto y quieres saber en qué hora sale bas rentable 💰.

    ❓ Para saber más sobre los comandos puedes hacer <b><i>/ayuda</i></b>
    ",
        username
    )
}

const WEEKDAYS: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// `Lunes 3 de enero de 2022`
pub fn spanish_title(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{} {} de {} de {}", weekday, date.day(), month, date.year())
}

/// Round to `decimals` and left-align in a `decimals + 2` wide column
pub fn format_price(value: f64, decimals: usize) -> String {
    let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let rounded = (value * factor).round() / factor;
    format!("{:<width$}", rounded, width = decimals + 2)
}

/// Emoji and short label of a regulated tariff section
pub fn section_style(section: TariffSection) -> (&'static str, &'static str) {
    match section {
        TariffSection::Peak => ("🔴", " [P] "),
        TariffSection::Mid => ("🟠", " [L] "),
        TariffSection::Valley => ("🟢", " [V] "),
    }
}

/// Emoji of a percentile band, sharing the section palette
pub fn band_emoji(band: PriceBand) -> &'static str {
    match band {
        PriceBand::High => "🔴",
        PriceBand::Mid => "🟠",
        PriceBand::Valley => "🟢",
    }
}

/// Formatting knobs taken from the analysis configuration
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub low_percentile: u8,
    pub high_percentile: u8,
    pub decimals: usize,
}

/// Two messages of a daily report: the summary (sent as the chart caption)
/// and the hourly price list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReport {
    pub summary: String,
    pub prices: String,
}

fn hour_span(point: &PricePoint) -> (String, String) {
    (
        point.timestamp.format("%Hh").to_string(),
        (point.timestamp + Duration::hours(1)).format("%Hh").to_string(),
    )
}

/// Daily report for a series, optionally with the price list sorted
/// from cheapest to most expensive
pub fn daily_report(
    series: &DailySeries,
    summary: &Summary,
    scheme: ColorScheme,
    sorted: bool,
    opts: &ReportOptions,
) -> DailyReport {
    let d = opts.decimals;
    let mut text = format!("ℹ Colores según {}.\n", scheme);
    if sorted {
        text.push_str("ℹ Precios ordenados de menor a mayor.\n");
    }
    text.push_str(&format!(
        "\n<b><u>{}</u></b>\n",
        spanish_title(series.date())
    ));

    text.push_str("<pre>");
    for (label, point) in [
        ("🔼 Precio máximo", &summary.max),
        ("🔽 Precio mínimo", &summary.min),
    ] {
        text.push_str(&format!(
            "{} ({}): {} €/kWh\n",
            label,
            point.timestamp.format("%Hh"),
            format_price(point.price, d)
        ));
    }
    text.push_str("</pre>\n<pre>");

    for (label, value) in [
        ("📊 Media del día".to_string(), summary.mean),
        (
            format!("📈 Percentil {}%", opts.low_percentile),
            summary.low_percentile,
        ),
        (
            format!("📉 Percentil {}%", opts.high_percentile),
            summary.high_percentile,
        ),
    ] {
        text.push_str(&format!("{}: {} €/kWh\n", label, format_price(value, d)));
    }
    text.push_str("</pre>\n<pre>");

    for (label, section) in [
        ("🟢 Media Valle", TariffSection::Valley),
        ("🟠 Media Llano", TariffSection::Mid),
        ("🔴 Media Punta", TariffSection::Peak),
    ] {
        let mean = summary.section_mean(section);
        if mean > 0.0 {
            text.push_str(&format!("{}: {} €/kWh\n", label, format_price(mean, d)));
        }
    }
    text.push_str("</pre>");

    let mut points: Vec<&PricePoint> = series.points().iter().collect();
    if sorted {
        points.sort_by(|a, b| a.price.total_cmp(&b.price));
    }

    let mut prices = String::from("<pre>");
    for point in points {
        let (section_emoji, section_label) = section_style(point.tariff_section);
        let (emoji, label) = match scheme {
            ColorScheme::Percentiles => (band_emoji(summary.band(point.price)), section_label),
            ColorScheme::Sections => (section_emoji, ""),
        };
        let (start, end) = hour_span(point);
        prices.push_str(&format!(
            "{}{}\t{} - {}:\t{} €/kWh\n",
            emoji,
            label,
            start,
            end,
            format_price(point.price, d)
        ));
    }
    prices.push_str("</pre>");

    DailyReport {
        summary: text,
        prices,
    }
}

/// Cheapest-window analysis, one block per window in the given order
pub fn window_analysis(
    date: NaiveDate,
    summary: &Summary,
    windows: &[PriceWindow],
    width: usize,
    decimals: usize,
) -> String {
    let mut text = format!(
        "<b><u>{}: Análisis estadístico.</u></b>\n\n",
        spanish_title(date)
    );
    text.push_str(&format!(
        "ℹ Colores según percentiles.\nℹ Búsqueda de lapsos de tiempo de {} horas, ordenadas de menor a mayor precio.\n\n",
        width
    ));

    for window in windows {
        let mean = window.mean();
        text.push_str(&format!(
            "<pre>{} [{:02}h - {:02}h]:\nPrecio total: {} €/kW ({}h)\nPrecio medio: {} €/kWh\n\n</pre>",
            band_emoji(summary.band(mean)),
            window.start_hour,
            window.end_hour,
            format_price(window.total, decimals),
            width,
            format_price(mean, decimals)
        ));
    }
    text
}

/// Pages of the settings menu; each has its own text and keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPage {
    Settings,
    Subscription,
    Regions,
    Colors,
}

impl SettingsPage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Subscription => "subscription",
            Self::Regions => "regions",
            Self::Colors => "colors",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "settings" => Ok(Self::Settings),
            "subscription" => Ok(Self::Subscription),
            "regions" => Ok(Self::Regions),
            "colors" => Ok(Self::Colors),
            other => Err(PvpcError::validation(
                "keyboard".to_string(),
                format!("unknown settings page '{}'", other),
            )),
        }
    }
}

/// Header text shown above a settings keyboard
pub fn settings_text(page: SettingsPage, settings: &UserSettings) -> String {
    match page {
        SettingsPage::Settings | SettingsPage::Subscription => {
            let (emoji, negation) = if settings.subscribed {
                ("🔊", "")
            } else {
                ("🔇", "NO ")
            };
            format!(
                "<b>⚙ Ajustes:\n\n{} Actualmente {}estás suscrito al bot.</b>",
                emoji, negation
            )
        }
        SettingsPage::Regions => format!("<b> 🗺 Región actual: {}</b>", settings.zone),
        SettingsPage::Colors => format!(
            "<b>📊 Colores actuales: según {}</b>",
            settings.color_scheme
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_titles() {
        let d = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        assert_eq!(spanish_title(d), "Lunes 3 de enero de 2022");
        let d = NaiveDate::from_ymd_opt(2023, 9, 16).unwrap();
        assert_eq!(spanish_title(d), "Sábado 16 de septiembre de 2023");
    }

    #[test]
    fn price_formatting_rounds_and_pads() {
        assert_eq!(format_price(0.123456789, 5), "0.12346");
        assert_eq!(format_price(0.1, 5), "0.1    ");
    }

    #[test]
    fn settings_texts() {
        let mut s = UserSettings::default();
        assert_eq!(
            settings_text(SettingsPage::Settings, &s),
            "<b>⚙ Ajustes:\n\n🔊 Actualmente estás suscrito al bot.</b>"
        );
        s.subscribed = false;
        assert!(settings_text(SettingsPage::Subscription, &s).contains("🔇 Actualmente NO estás"));
        assert_eq!(
            settings_text(SettingsPage::Regions, &s),
            "<b> 🗺 Región actual: Península</b>"
        );
        assert_eq!(
            settings_text(SettingsPage::Colors, &s),
            "<b>📊 Colores actuales: según percentiles</b>"
        );
    }

    #[test]
    fn settings_pages_parse() {
        assert_eq!(SettingsPage::parse("regions").unwrap(), SettingsPage::Regions);
        assert!(SettingsPage::parse("nope").is_err());
    }
}
