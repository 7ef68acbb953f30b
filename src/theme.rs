use crate::review::Severity;
use crossterm::style::Color;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed presentation token for a severity: badge/highlight colours plus label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityPresentation {
    pub background: Color,
    pub foreground: Color,
    pub label: &'static str,
}

impl SeverityPresentation {
    /// `#rrggbb` pair for renderers that do not speak terminal colours.
    pub fn hex_pair(&self) -> (String, String) {
        (hex(self.background), hex(self.foreground))
    }
}

#[derive(Clone)]
pub struct SeverityPalette {
    pub critical: SeverityPresentation,
    pub warning: SeverityPresentation,
    pub info: SeverityPresentation,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ThemeId {
    Light = 0,
    Dark = 1,
}

impl ThemeId {
    pub fn name(&self) -> &'static str {
        match self {
            ThemeId::Light => "Light",
            ThemeId::Dark => "Dark",
        }
    }

    pub fn all() -> &'static [ThemeId] {
        &[ThemeId::Light, ThemeId::Dark]
    }

    pub fn from_name(name: &str) -> Option<ThemeId> {
        Self::all()
            .iter()
            .copied()
            .find(|id| id.name().eq_ignore_ascii_case(name.trim()))
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            1 => ThemeId::Dark,
            _ => ThemeId::Light,
        }
    }
}

static CURRENT_THEME_INDEX: AtomicUsize = AtomicUsize::new(0);

pub fn current_theme_id() -> ThemeId {
    ThemeId::from_index(CURRENT_THEME_INDEX.load(Ordering::Relaxed))
}

pub fn set_theme(theme: ThemeId) {
    CURRENT_THEME_INDEX.store(theme as usize, Ordering::Relaxed);
}

pub fn current_palette() -> &'static SeverityPalette {
    match current_theme_id() {
        ThemeId::Light => &LIGHT_PALETTE,
        ThemeId::Dark => &DARK_PALETTE,
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb {
        r: ((hex >> 16) & 0xFF) as u8,
        g: ((hex >> 8) & 0xFF) as u8,
        b: (hex & 0xFF) as u8,
    }
}

static LIGHT_PALETTE: SeverityPalette = SeverityPalette {
    critical: SeverityPresentation {
        background: rgb(0xFDECEA),
        foreground: rgb(0xB3261E),
        label: "Critical",
    },
    warning: SeverityPresentation {
        background: rgb(0xFFF4E5),
        foreground: rgb(0x8A5300),
        label: "Warning",
    },
    info: SeverityPresentation {
        background: rgb(0xE8F1FD),
        foreground: rgb(0x1A5BB5),
        label: "Info",
    },
};

static DARK_PALETTE: SeverityPalette = SeverityPalette {
    critical: SeverityPresentation {
        background: rgb(0x4A1C1A),
        foreground: rgb(0xF38BA8),
        label: "Critical",
    },
    warning: SeverityPresentation {
        background: rgb(0x4A3A12),
        foreground: rgb(0xF9E2AF),
        label: "Warning",
    },
    info: SeverityPresentation {
        background: rgb(0x1C2F4A),
        foreground: rgb(0x89B4FA),
        label: "Info",
    },
};

impl SeverityPalette {
    pub fn presentation(&self, severity: Severity) -> SeverityPresentation {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

pub fn presentation(severity: Severity) -> SeverityPresentation {
    current_palette().presentation(severity)
}

/// Presentation for a raw severity string; anything unrecognised shows as info.
pub fn presentation_for(raw: &str) -> SeverityPresentation {
    presentation(Severity::from(raw.to_string()))
}

fn hex(color: Color) -> String {
    match color {
        Color::Rgb { r, g, b } => format!("#{r:02x}{g:02x}{b:02x}"),
        other => format!("{other:?}"),
    }
}
