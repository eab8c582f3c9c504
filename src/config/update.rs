use crate::config::model::{ImageRef, ThemeStops};
use crate::foundation::error::{PostError, PostResult};
use crate::presets::tables::{AspectRatio, theme_by_label};

/// A single-field edit of a [`crate::PostConfig`].
///
/// One variant per document field. The two theme stops only travel together as
/// [`FieldUpdate::Theme`].
#[derive(Clone, Debug, PartialEq)]
pub enum FieldUpdate {
    /// Replace `name`.
    Name(String),
    /// Replace `quote`.
    Quote(String),
    /// Replace `phoneNumber`.
    PhoneNumber(String),
    /// Replace `website`.
    Website(String),
    /// Replace `fontFamily`.
    FontFamily(String),
    /// Replace `fontSize`.
    FontSize(u32),
    /// Replace `isBold`.
    IsBold(bool),
    /// Replace `textShadow`.
    TextShadow(bool),
    /// Replace `imageUrl`.
    ImageUrl(Option<ImageRef>),
    /// Replace `imageOpacity`.
    ImageOpacity(u8),
    /// Replace `imageScale`.
    ImageScale(u16),
    /// Replace `textBackgroundImageUrl`.
    TextBackgroundImageUrl(Option<ImageRef>),
    /// Replace `textBackgroundOpacity`.
    TextBackgroundOpacity(u8),
    /// Replace `backgroundImageUrl`.
    BackgroundImageUrl(Option<ImageRef>),
    /// Replace `backgroundOpacity`.
    BackgroundOpacity(u8),
    /// Replace `backgroundScale`.
    BackgroundScale(u16),
    /// Replace `backgroundBlur`.
    BackgroundBlur(u8),
    /// Replace `footerImageUrl`.
    FooterImageUrl(Option<ImageRef>),
    /// Replace both theme stops.
    Theme(ThemeStops),
    /// Replace `aspectRatio`.
    AspectRatio(AspectRatio),
    /// Replace `transparentBackground`.
    TransparentBackground(bool),
}

impl FieldUpdate {
    /// Serialized (camelCase) keys of the document fields this update replaces.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Name(_) => &["name"],
            Self::Quote(_) => &["quote"],
            Self::PhoneNumber(_) => &["phoneNumber"],
            Self::Website(_) => &["website"],
            Self::FontFamily(_) => &["fontFamily"],
            Self::FontSize(_) => &["fontSize"],
            Self::IsBold(_) => &["isBold"],
            Self::TextShadow(_) => &["textShadow"],
            Self::ImageUrl(_) => &["imageUrl"],
            Self::ImageOpacity(_) => &["imageOpacity"],
            Self::ImageScale(_) => &["imageScale"],
            Self::TextBackgroundImageUrl(_) => &["textBackgroundImageUrl"],
            Self::TextBackgroundOpacity(_) => &["textBackgroundOpacity"],
            Self::BackgroundImageUrl(_) => &["backgroundImageUrl"],
            Self::BackgroundOpacity(_) => &["backgroundOpacity"],
            Self::BackgroundScale(_) => &["backgroundScale"],
            Self::BackgroundBlur(_) => &["backgroundBlur"],
            Self::FooterImageUrl(_) => &["footerImageUrl"],
            Self::Theme(_) => &["themeColorFrom", "themeColorTo"],
            Self::AspectRatio(_) => &["aspectRatio"],
            Self::TransparentBackground(_) => &["transparentBackground"],
        }
    }

    /// Parse a `key=value` style edit.
    ///
    /// Image keys accept an empty value to clear the image. `theme` accepts either a preset
    /// label (`Green-Teal`) or an explicit `from-token,to-token` pair.
    pub fn parse(key: &str, value: &str) -> PostResult<Self> {
        let text = || value.to_owned();
        let image = || {
            let v = value.trim();
            (!v.is_empty()).then(|| ImageRef::new(v))
        };

        let update = match key.trim() {
            "name" => Self::Name(text()),
            "quote" => Self::Quote(text()),
            "phoneNumber" => Self::PhoneNumber(text()),
            "website" => Self::Website(text()),
            "fontFamily" => Self::FontFamily(text()),
            "fontSize" => Self::FontSize(parse_num(key, value)?),
            "isBold" => Self::IsBold(parse_bool(key, value)?),
            "textShadow" => Self::TextShadow(parse_bool(key, value)?),
            "imageUrl" => Self::ImageUrl(image()),
            "imageOpacity" => Self::ImageOpacity(parse_num(key, value)?),
            "imageScale" => Self::ImageScale(parse_num(key, value)?),
            "textBackgroundImageUrl" => Self::TextBackgroundImageUrl(image()),
            "textBackgroundOpacity" => Self::TextBackgroundOpacity(parse_num(key, value)?),
            "backgroundImageUrl" => Self::BackgroundImageUrl(image()),
            "backgroundOpacity" => Self::BackgroundOpacity(parse_num(key, value)?),
            "backgroundScale" => Self::BackgroundScale(parse_num(key, value)?),
            "backgroundBlur" => Self::BackgroundBlur(parse_num(key, value)?),
            "footerImageUrl" => Self::FooterImageUrl(image()),
            "theme" => Self::Theme(parse_theme(value)),
            "themeColorFrom" | "themeColorTo" => {
                return Err(PostError::validation(format!(
                    "'{key}' cannot be set on its own; use theme=<from>,<to>"
                )));
            }
            "aspectRatio" => Self::AspectRatio(AspectRatio::parse(value).ok_or_else(|| {
                PostError::validation(format!(
                    "aspectRatio must be square, portrait or landscape (got '{value}')"
                ))
            })?),
            "transparentBackground" => Self::TransparentBackground(parse_bool(key, value)?),
            other => {
                return Err(PostError::validation(format!("unknown field '{other}'")));
            }
        };
        Ok(update)
    }

    /// Parse `key=value`.
    pub fn parse_assignment(assignment: &str) -> PostResult<Self> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            PostError::validation(format!("expected key=value, got '{assignment}'"))
        })?;
        Self::parse(key, value)
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> PostResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| PostError::validation(format!("'{key}' expects a number, got '{value}'")))
}

fn parse_bool(key: &str, value: &str) -> PostResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PostError::validation(format!(
            "'{key}' expects true/false, got '{value}'"
        ))),
    }
}

fn parse_theme(value: &str) -> ThemeStops {
    match value.split_once(',') {
        Some((from, to)) => ThemeStops::new(from.trim(), to.trim()),
        None => {
            let preset = theme_by_label(value);
            ThemeStops::new(preset.from, preset.to)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/update.rs"]
mod tests;
