use serde::{Deserialize, Serialize};

/// Post proportions offered by the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectRatio {
    /// 1:1
    #[default]
    Square,
    /// 4:5
    Portrait,
    /// 16:9
    Landscape,
}

impl AspectRatio {
    /// Parse the lowercase wire name; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Some(Self::Square),
            "portrait" => Some(Self::Portrait),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }
}

/// One entry of the aspect-ratio table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AspectPreset {
    /// Label shown in the editor.
    pub label: &'static str,
    /// Value stored in the document.
    pub value: AspectRatio,
    /// Width units of the proportion.
    pub width: u32,
    /// Height units of the proportion.
    pub height: u32,
}

impl AspectPreset {
    /// Height for a given width under this proportion.
    pub fn height_for(&self, width: f64) -> f64 {
        width * f64::from(self.height) / f64::from(self.width)
    }
}

/// Aspect-ratio choices in editor order.
pub const ASPECT_RATIOS: &[AspectPreset] = &[
    AspectPreset {
        label: "Square (1:1)",
        value: AspectRatio::Square,
        width: 1,
        height: 1,
    },
    AspectPreset {
        label: "Portrait (4:5)",
        value: AspectRatio::Portrait,
        width: 4,
        height: 5,
    },
    AspectPreset {
        label: "Landscape (16:9)",
        value: AspectRatio::Landscape,
        width: 16,
        height: 9,
    },
];

/// Look up the layout preset for an aspect ratio, falling back to square.
pub fn aspect_preset(value: AspectRatio) -> &'static AspectPreset {
    ASPECT_RATIOS
        .iter()
        .find(|p| p.value == value)
        .unwrap_or(&ASPECT_RATIOS[0])
}

/// A paired gradient preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorTheme {
    /// Label shown in the editor.
    pub label: &'static str,
    /// `from-*` stop token.
    pub from: &'static str,
    /// `to-*` stop token.
    pub to: &'static str,
}

/// Gradient presets in editor order.
pub const COLOR_THEMES: &[ColorTheme] = &[
    ColorTheme {
        label: "Blue-Purple",
        from: "from-blue-700",
        to: "to-purple-700",
    },
    ColorTheme {
        label: "Green-Teal",
        from: "from-emerald-700",
        to: "to-teal-600",
    },
    ColorTheme {
        label: "Red-Orange",
        from: "from-red-700",
        to: "to-orange-600",
    },
    ColorTheme {
        label: "Dark Slate",
        from: "from-slate-800",
        to: "to-gray-900",
    },
];

/// Theme by table index, falling back to the first theme.
pub fn theme_by_index(index: usize) -> &'static ColorTheme {
    COLOR_THEMES.get(index).unwrap_or(&COLOR_THEMES[0])
}

/// Theme by case-insensitive label, falling back to the first theme.
pub fn theme_by_label(label: &str) -> &'static ColorTheme {
    COLOR_THEMES
        .iter()
        .find(|t| t.label.eq_ignore_ascii_case(label.trim()))
        .unwrap_or(&COLOR_THEMES[0])
}

/// Built-in font choices: display label and CSS-style family reference.
pub const DEFAULT_FONTS: &[(&str, &str)] = &[
    ("Nastaliq", "'Noto Nastaliq Urdu', serif"),
    ("Gulzar", "'Gulzar', serif"),
    ("Amiri", "'Amiri', serif"),
    ("Lateef", "'Lateef', serif"),
    ("Rakkas", "'Rakkas', serif"),
];

/// Stock backgrounds for the random picker.
pub const STOCK_BACKGROUNDS: &[&str] = &[
    "https://images.unsplash.com/photo-1451187580459-43490279c0fa?q=80&w=2072&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1518770660439-4636190af475?q=80&w=2070&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1550751827-4bd374c3f58b?q=80&w=2070&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1526374965328-7f61d4dc18c5?q=80&w=2070&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1614064641938-3bbee52942c7?q=80&w=2070&auto=format&fit=crop",
    "https://images.unsplash.com/photo-1531297461136-82af022f0b79?q=80&w=2070&auto=format&fit=crop",
];
