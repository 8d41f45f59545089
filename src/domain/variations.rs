pub const VARIATION_COUNT: usize = 3;

/// Stylistic endings appended to the base prompt. Index 0 is always the
/// vibrant variant.
const VARIATION_SUFFIXES: [&str; VARIATION_COUNT] = [
    "vibrant colors, high contrast, professional lighting, 4K quality",
    "dramatic lighting, bold typography space, eye-catching composition",
    "cinematic feel, dynamic angles, premium quality, engaging visual",
];

/// Build the three candidate prompts for a photo-based thumbnail.
///
/// Pure string formatting: identical inputs always give identical output in
/// the same order.
pub fn variations(
    description: &str,
    video_type: &str,
    style: &str,
    mood: &str,
    placement: &str,
) -> [String; VARIATION_COUNT] {
    let base = base_prompt(description, video_type, style, mood, placement);
    VARIATION_SUFFIXES.map(|suffix| format!("{base}, {suffix}"))
}

fn base_prompt(
    description: &str,
    video_type: &str,
    style: &str,
    mood: &str,
    placement: &str,
) -> String {
    format!(
        "{description}. YouTube thumbnail for {video_type}, {style} style, {mood} mood, subject positioned {placement}"
    )
}
