use crate::config::update::FieldUpdate;

/// Inclusive range of an editor control, with its step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    /// Smallest accepted value.
    pub min: u32,
    /// Largest accepted value.
    pub max: u32,
    /// Slider step.
    pub step: u32,
}

impl Bounds {
    const fn new(min: u32, max: u32, step: u32) -> Self {
        Self { min, max, step }
    }

    /// Clamp into range and snap to the nearest step above `min`.
    pub fn clamp(self, v: u32) -> u32 {
        let v = v.clamp(self.min, self.max);
        if self.step <= 1 {
            return v;
        }
        let steps = (v - self.min + self.step / 2) / self.step;
        (self.min + steps * self.step).min(self.max)
    }
}

/// Quote font size in pixels.
pub const FONT_SIZE: Bounds = Bounds::new(16, 80, 1);
/// Opacity in percent.
pub const OPACITY: Bounds = Bounds::new(0, 100, 1);
/// Image scale in percent.
pub const SCALE: Bounds = Bounds::new(100, 200, 5);
/// Background blur in pixels.
pub const BLUR: Bounds = Bounds::new(0, 20, 1);

/// Bring numeric updates into the ranges the editor controls allow.
///
/// The document model accepts any value; this is applied by input layers before
/// [`crate::PostConfig::with`]. Non-numeric updates pass through unchanged.
pub fn clamp_update(update: FieldUpdate) -> FieldUpdate {
    // Each bounded value fits its own field type after clamping.
    let c8 = |b: Bounds, v: u8| b.clamp(u32::from(v)) as u8;
    let c16 = |b: Bounds, v: u16| b.clamp(u32::from(v)) as u16;
    match update {
        FieldUpdate::FontSize(v) => FieldUpdate::FontSize(FONT_SIZE.clamp(v)),
        FieldUpdate::ImageOpacity(v) => FieldUpdate::ImageOpacity(c8(OPACITY, v)),
        FieldUpdate::TextBackgroundOpacity(v) => {
            FieldUpdate::TextBackgroundOpacity(c8(OPACITY, v))
        }
        FieldUpdate::BackgroundOpacity(v) => FieldUpdate::BackgroundOpacity(c8(OPACITY, v)),
        FieldUpdate::ImageScale(v) => FieldUpdate::ImageScale(c16(SCALE, v)),
        FieldUpdate::BackgroundScale(v) => FieldUpdate::BackgroundScale(c16(SCALE, v)),
        FieldUpdate::BackgroundBlur(v) => FieldUpdate::BackgroundBlur(c8(BLUR, v)),
        other => other,
    }
}
