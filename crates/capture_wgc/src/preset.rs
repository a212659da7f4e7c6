//! Aspect-ratio and fixed-size presets for region selection

/// A selection constraint. `ratio` and `fixed_size` are mutually exclusive;
/// neither means free-form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatioPreset {
    pub name: &'static str,
    /// Width divided by height, kept as an integer pair to avoid float drift.
    pub ratio: Option<(u32, u32)>,
    pub fixed_size: Option<(u32, u32)>,
}

impl AspectRatioPreset {
    const fn free(name: &'static str) -> Self {
        Self { name, ratio: None, fixed_size: None }
    }

    const fn ratio(name: &'static str, w: u32, h: u32) -> Self {
        Self { name, ratio: Some((w, h)), fixed_size: None }
    }

    const fn fixed(name: &'static str, w: u32, h: u32) -> Self {
        Self { name, ratio: None, fixed_size: Some((w, h)) }
    }

    pub fn find(name: &str) -> Option<&'static AspectRatioPreset> {
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl Default for AspectRatioPreset {
    fn default() -> Self {
        PRESETS[0]
    }
}

pub static PRESETS: [AspectRatioPreset; 7] = [
    AspectRatioPreset::free("Free"),
    AspectRatioPreset::ratio("16:9", 16, 9),
    AspectRatioPreset::ratio("4:3", 4, 3),
    AspectRatioPreset::ratio("1:1", 1, 1),
    AspectRatioPreset::ratio("9:16", 9, 16),
    AspectRatioPreset::fixed("720p", 1280, 720),
    AspectRatioPreset::fixed("1080p", 1920, 1080),
];
