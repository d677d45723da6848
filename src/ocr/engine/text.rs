use crate::ocr::BBox;

pub(super) fn join_words<'a>(words: impl IntoIterator<Item = &'a str>) -> String {
    let mut text = String::new();
    for word in words {
        let word = word.trim();
        if word.is_empty() {
            continue;
        }
        if !text.is_empty() && needs_space(&text, word) {
            text.push(' ');
        }
        text.push_str(word);
    }
    text
}

/// Joins the words of one line, turning each horizontal gap into as many
/// spaces as fit at the line's average character width (at least one where a
/// space is needed). Column gaps inside a single engine line survive this.
pub(super) fn join_words_spaced(words: &[(String, BBox)]) -> String {
    let chars: usize = words.iter().map(|(word, _)| word.chars().count()).sum();
    let width: u32 = words.iter().map(|(_, bbox)| bbox.width()).sum();
    if chars == 0 || width == 0 {
        return join_words(words.iter().map(|(word, _)| word.as_str()));
    }
    let char_width = width as f32 / chars as f32;

    let mut text = String::new();
    let mut prev: Option<&BBox> = None;
    for (word, bbox) in words {
        let word = word.trim();
        if word.is_empty() {
            continue;
        }
        if let Some(prev) = prev {
            let gap = bbox.x0.saturating_sub(prev.x1) as f32;
            let mut spaces = (gap / char_width).round() as usize;
            if needs_space(&text, word) {
                spaces = spaces.max(1);
            }
            text.push_str(&" ".repeat(spaces));
        }
        text.push_str(word);
        prev = Some(bbox);
    }
    text
}

fn needs_space(left: &str, right: &str) -> bool {
    let last = left.chars().rev().find(|ch| !ch.is_whitespace());
    let first = right.chars().find(|ch| !ch.is_whitespace());
    match (last, first) {
        (Some(a), Some(b)) => !(is_cjk_or_kana(a) && is_cjk_or_kana(b)),
        _ => false,
    }
}

fn is_cjk_or_kana(ch: char) -> bool {
    matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0x31F0..=0x31FF | 0x3400..=0x4DBF
    )
}
