//! Battle screen text: the `Wild <name>` banner and the map name.
//!
//! OCR output is noisy, so everything here works on whole lines and words
//! and leaves matching against known names to the caller.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Image, OwnedImage};

static FALLBACK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bWild\s+(?:[Ss]hiny\s+)?(?<name>[A-Z][A-Za-z'.\-]{2,})").unwrap()
});

/// Words that show up around the subject name in the encounter banner.
const FILLER: &[&str] = &["wild", "a", "an", "appeared", "appears", "has", "you", "encountered", "shiny", "lv", "level"];

/// The last OCR line mentioning a wild encounter.
pub fn encounter_line(text: &str) -> Option<&str> {
    text.lines().rev().find(|line| line.contains("Wild"))
}

/// Words of the encounter line that could be the subject name.
pub fn candidate_words(line: &str) -> Vec<&str> {
    line.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .filter(|word| !FILLER.iter().any(|f| f.eq_ignore_ascii_case(word)))
        .filter(|word| !is_level_tag(word))
        .collect()
}

/// The capitalized word following `Wild`, used when no known name matches.
pub fn fallback_subject(line: &str) -> Option<&str> {
    let name = FALLBACK_REGEX.captures(line)?.name("name")?.as_str();
    let name = name.trim_end_matches(['.', '\'', '-']);
    (!FILLER.iter().any(|f| f.eq_ignore_ascii_case(name))).then_some(name)
}

// "Lv5", "Lv.12"
fn is_level_tag(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    lower
        .strip_prefix("lv")
        .map(|rest| rest.trim_start_matches('.'))
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Grayscale copy for the banner pass.
pub fn grayscale(image: Image) -> OwnedImage {
    OwnedImage::from_gray_as_rgb(&image.to_gray_image())
}

/// Binarized variants of a frame for the location pass. The caller keeps the
/// most plausible OCR result (see [`score_ocr_text`]).
pub fn location_candidates(image: Image) -> Vec<OwnedImage> {
    use imageproc::contrast::{ThresholdType, adaptive_threshold, equalize_histogram, otsu_level, threshold};

    // OCR generally performs better on larger glyphs.
    const MIN_H: u32 = 80;
    let mut base = image.to_owned_image();
    if base.height() < MIN_H {
        base = base.resized_h(MIN_H);
    }

    let gray = base.as_image().to_gray_image();
    let equalized = equalize_histogram(&gray);

    let adaptive = ensure_dark_text_on_light(adaptive_threshold(&equalized, 7, 10));
    let otsu = {
        let level = otsu_level(&equalized);
        ensure_dark_text_on_light(threshold(&equalized, level, ThresholdType::Binary))
    };

    vec![
        OwnedImage::from_gray_as_rgb(&adaptive),
        OwnedImage::from_gray_as_rgb(&otsu),
        OwnedImage::from_gray_as_rgb(&gray),
    ]
}

fn ensure_dark_text_on_light(mut bin: image::GrayImage) -> image::GrayImage {
    // Mostly black means light text on a dark panel; invert it.
    let white = bin.pixels().filter(|p| p.0[0] > 0).count();
    let black = (bin.width() * bin.height()) as usize - white;
    if black > white {
        for p in bin.pixels_mut() {
            p.0[0] = 255u8.saturating_sub(p.0[0]);
        }
    }
    bin
}

/// Prefers text with more alphanumerics (less noise) and more lines.
pub fn score_ocr_text(text: &str) -> i64 {
    let mut score = 0i64;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            score += 3;
        } else if !ch.is_whitespace() {
            score += 1;
        }
    }
    score + text.lines().count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn picks_last_wild_line() {
        let text = "Route 1\nWild Rattata\nFight Bag\nWild Pidgey Lv.3\nRun";
        assert_eq!(encounter_line(text), Some("Wild Pidgey Lv.3"));
        assert_eq!(encounter_line("Route 1\nwild grass"), None);
    }

    #[test]
    fn candidates_skip_filler() {
        assert_eq!(candidate_words("A Wild Pidgey appeared!"), ["Pidgey"]);
        assert_eq!(candidate_words("Wild Mr. Mime Lv.12 (7)"), ["Mr", "Mime"]);
        assert_eq!(candidate_words("Wild Porygon2 Lv5"), ["Porygon2"]);
    }

    #[test]
    fn fallback_takes_word_after_wild() {
        assert_eq!(fallback_subject("A Wild Pidgey appeared!"), Some("Pidgey"));
        assert_eq!(fallback_subject("Wild Shiny Farfetch'd Lv.9"), Some("Farfetch'd"));
        assert_eq!(fallback_subject("Wild appeared"), None);
        assert_eq!(fallback_subject("Wild 12"), None);
    }

    #[test]
    fn level_tags() {
        assert!(is_level_tag("Lv5"));
        assert!(is_level_tag("Lv.12"));
        assert!(!is_level_tag("Lv"));
        assert!(!is_level_tag("Lvdisc"));
    }

    #[test]
    fn inverts_light_on_dark() {
        let mut img = image::GrayImage::new(4, 1);
        img.put_pixel(0, 0, image::Luma([255]));
        let out = ensure_dark_text_on_light(img);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn candidates_upscale_small_frames() {
        let mut frame = OwnedImage::new(100, 20, Color::WHITE);
        for x in 10..60 {
            for y in 5..15 {
                frame.set_pixel(x, y, Color::BLACK);
            }
        }
        let candidates = location_candidates(frame.as_image());
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.height() == 80 && c.width() == 400));
    }

    #[test]
    fn score_prefers_clean_text() {
        assert!(score_ocr_text("Viridian Forest") > score_ocr_text("V|r~d:an F0r"));
    }
}
