use crate::foundation::core::Rgba8;

/// Named colours used by theme tokens and fixed chrome.
///
/// Values are the Tailwind v3 palette entries the presets refer to.
const PALETTE: &[(&str, Rgba8)] = &[
    ("blue-700", Rgba8::opaque(0x1d, 0x4e, 0xd8)),
    ("purple-700", Rgba8::opaque(0x7e, 0x22, 0xce)),
    ("emerald-700", Rgba8::opaque(0x04, 0x78, 0x57)),
    ("teal-600", Rgba8::opaque(0x0d, 0x94, 0x88)),
    ("red-700", Rgba8::opaque(0xb9, 0x1c, 0x1c)),
    ("orange-600", Rgba8::opaque(0xea, 0x58, 0x0c)),
    ("slate-800", Rgba8::opaque(0x1e, 0x29, 0x3b)),
    ("gray-900", Rgba8::opaque(0x11, 0x18, 0x27)),
    ("slate-50", Rgba8::opaque(0xf8, 0xfa, 0xfc)),
    ("slate-200", Rgba8::opaque(0xe2, 0xe8, 0xf0)),
    ("white", Rgba8::WHITE),
    ("black", Rgba8::BLACK),
];

/// Quote panel fill when no background image shows through.
pub const SLATE_50: Rgba8 = Rgba8::opaque(0xf8, 0xfa, 0xfc);
/// Decorative quote mark colour.
pub const SLATE_200: Rgba8 = Rgba8::opaque(0xe2, 0xe8, 0xf0);
/// Quote text colour.
pub const SLATE_800: Rgba8 = Rgba8::opaque(0x1e, 0x29, 0x3b);

/// Fallback colour for `from-*` stops.
pub const DEFAULT_FROM: Rgba8 = Rgba8::opaque(0x1d, 0x4e, 0xd8);
/// Fallback colour for `to-*` stops.
pub const DEFAULT_TO: Rgba8 = Rgba8::opaque(0x7e, 0x22, 0xce);

/// Which side of a gradient a token names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
    /// `from-*` token.
    From,
    /// `to-*` token.
    To,
}

/// Resolve a theme token such as `from-blue-700` (or a bare `#rrggbb`) to a colour.
///
/// Unknown tokens fall back to the default theme colour for that stop.
pub fn resolve_token(token: &str, stop: Stop) -> Rgba8 {
    let fallback = match stop {
        Stop::From => DEFAULT_FROM,
        Stop::To => DEFAULT_TO,
    };
    let token = token.trim();
    if token.starts_with('#') {
        return Rgba8::from_hex(token).unwrap_or(fallback);
    }
    let name = token
        .strip_prefix("from-")
        .or_else(|| token.strip_prefix("to-"))
        .or_else(|| token.strip_prefix("via-"))
        .unwrap_or(token);
    named(name).unwrap_or(fallback)
}

/// Look up a bare palette name (`blue-700`).
pub fn named(name: &str) -> Option<Rgba8> {
    PALETTE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, c)| *c)
}
