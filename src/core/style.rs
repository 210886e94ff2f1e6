/// Classification of an anomaly degree for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyClass {
    High,
    Low,
    Usual,
    NotAvailable,
}

impl AnomalyClass {
    /// Short label used in log lines and legends
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Low => "Low",
            Self::Usual => "Usual",
            Self::NotAvailable => "N/A",
        }
    }

    /// Display colour for this class
    pub fn color(&self) -> &'static str {
        match self {
            Self::High => ANOMALY_HIGH,
            Self::Low => ANOMALY_LOW,
            Self::Usual => ANOMALY_USUAL,
            Self::NotAvailable => "#9e9e9e",
        }
    }
}

/// Classify an anomaly degree (NaN classifies as not available)
pub fn classify_anomaly(degree: f64) -> AnomalyClass {
    if degree > 0.0 {
        AnomalyClass::High
    } else if degree < 0.0 {
        AnomalyClass::Low
    } else if degree == 0.0 {
        AnomalyClass::Usual
    } else {
        AnomalyClass::NotAvailable
    }
}

pub const ANOMALY_USUAL: &str = "#5BBA6F";
pub const ANOMALY_LOW: &str = "#85b0d5BE";
pub const ANOMALY_HIGH: &str = "#ff795b";

/// One band of the metric-value colour ramp: `[min, max]` with the colours
/// at each end of the band
struct ColorStop {
    min: f64,
    max: f64,
    start: &'static str,
    end: &'static str,
}

const VALUE_COLOR_STOPS: [ColorStop; 6] = [
    ColorStop { min: 0.0, max: 0.15, start: "#ffffff", end: "#fef0d9" },
    ColorStop { min: 0.15, max: 0.3, start: "#fef0d9", end: "#fdd49e" },
    ColorStop { min: 0.3, max: 0.45, start: "#fdd49e", end: "#fdbb84" },
    ColorStop { min: 0.45, max: 0.6, start: "#fdbb84", end: "#fc8d59" },
    ColorStop { min: 0.6, max: 0.75, start: "#fc8d59", end: "#e34a33" },
    ColorStop { min: 0.75, max: 1.0, start: "#e34a33", end: "#b30000" },
];

/// An RGB colour triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Parse a hex colour string like "#ff795b" (a trailing alpha pair is ignored)
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    // Length is in bytes; non-ascii input would split a character below
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb { r, g, b })
}

/// Format an RGB triple as a hex colour string
pub fn rgb_to_hex(rgb: Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.r, rgb.g, rgb.b)
}

/// Colour for a metric value in `[0, 1]`, linearly interpolated within the
/// band of the ramp the value falls into (clamped at the ends)
pub fn value_color(value: f64) -> Rgb {
    let v = value.clamp(0.0, 1.0);
    let stop = VALUE_COLOR_STOPS
        .iter()
        .find(|s| v >= s.min && v <= s.max)
        .unwrap_or(&VALUE_COLOR_STOPS[5]);

    // Stop colours are compile-time constants, so the parses cannot fail
    let start = hex_to_rgb(stop.start).unwrap_or(Rgb { r: 0, g: 0, b: 0 });
    let end = hex_to_rgb(stop.end).unwrap_or(Rgb { r: 0, g: 0, b: 0 });

    let t = if stop.max > stop.min {
        (v - stop.min) / (stop.max - stop.min)
    } else {
        0.0
    };
    let lerp = |a: u8, b: u8| -> u8 { (a as f64 + (b as f64 - a as f64) * t).round() as u8 };
    Rgb {
        r: lerp(start.r, end.r),
        g: lerp(start.g, end.g),
        b: lerp(start.b, end.b),
    }
}
