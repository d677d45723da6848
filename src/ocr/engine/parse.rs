use std::collections::HashMap;

use crate::ocr::{BBox, TextFragment};

use super::geom::{bbox_from_ltwh, union_bbox};
use super::text::{join_words, join_words_spaced};

const TSV_MIN_FIELDS: usize = 12;
const TSV_WORD_LEVEL: i32 = 5;

type LineKey = (i32, i32, i32, i32);

struct LineAccumulator {
    words: Vec<(String, BBox)>,
    bbox: BBox,
}

impl LineAccumulator {
    fn into_text(self, preserve_spaces: bool) -> String {
        if preserve_spaces {
            join_words_spaced(&self.words)
        } else {
            join_words(self.words.iter().map(|(word, _)| word.as_str()))
        }
    }
}

/// Folds Tesseract TSV word rows into line fragments. Lines keep the order in
/// which the engine first reported them. With `preserve_spaces`, gaps between
/// words are sized from their boxes instead of collapsing to one space.
pub(super) fn parse_tsv_fragments(tsv: &str, preserve_spaces: bool) -> Vec<TextFragment> {
    let mut order: Vec<LineKey> = Vec::new();
    let mut lines: HashMap<LineKey, LineAccumulator> = HashMap::new();

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < TSV_MIN_FIELDS {
            continue;
        }
        let level: i32 = cols[0].parse().unwrap_or(0);
        if level != TSV_WORD_LEVEL {
            continue;
        }
        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 {
            continue;
        }
        let key = (
            cols[1].parse().unwrap_or(0),
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        let bbox = bbox_from_ltwh(
            cols[6].parse().unwrap_or(0),
            cols[7].parse().unwrap_or(0),
            cols[8].parse().unwrap_or(0),
            cols[9].parse().unwrap_or(0),
        );

        match lines.get_mut(&key) {
            Some(line) => {
                line.words.push((text.to_string(), bbox));
                line.bbox = union_bbox(&line.bbox, &bbox);
            }
            None => {
                order.push(key);
                lines.insert(
                    key,
                    LineAccumulator {
                        words: vec![(text.to_string(), bbox)],
                        bbox,
                    },
                );
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| lines.remove(&key))
        .map(|line| {
            let bbox = line.bbox;
            TextFragment {
                text: line.into_text(preserve_spaces),
                bbox,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    fn tsv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn groups_words_into_lines() {
        let input = tsv(&[
            "1\t1\t0\t0\t0\t0\t0\t0\t400\t200\t-1\t",
            "4\t1\t1\t1\t1\t0\t10\t10\t200\t20\t-1\t",
            "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.1\tName",
            "5\t1\t1\t1\t1\t2\t120\t12\t60\t18\t91.0\tPrice",
            "5\t1\t1\t1\t2\t1\t10\t40\t50\t20\t93.2\tApple",
            "5\t1\t1\t1\t2\t2\t120\t41\t30\t19\t90.4\t1.20",
        ]);
        let fragments = parse_tsv_fragments(&input, false);
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0].text, "Name Price");
        assert_eq!(fragments[0].bbox, BBox::new(10, 10, 180, 30));
        assert_eq!(fragments[1].text, "Apple 1.20");
        assert_eq!(fragments[1].bbox, BBox::new(10, 40, 150, 60));
    }

    #[test]
    fn keeps_engine_line_order() {
        let input = tsv(&[
            "5\t1\t2\t1\t1\t1\t10\t90\t50\t20\t90\tlower",
            "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t90\tupper",
        ]);
        let fragments = parse_tsv_fragments(&input, false);
        let texts = fragments.iter().map(|f| f.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["lower", "upper"]);
    }

    #[test]
    fn skips_empty_and_unconfident_words() {
        let input = tsv(&[
            "5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t-1\tghost",
            "5\t1\t1\t1\t1\t2\t70\t10\t50\t20\t88\t   ",
            "garbage row",
            "5\t1\t1\t1\t1\t3\t130\t10\t50\t20\t88\tkept",
        ]);
        let fragments = parse_tsv_fragments(&input, false);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "kept");
        assert_eq!(fragments[0].bbox, BBox::new(130, 10, 180, 30));
    }

    #[test]
    fn preserved_spacing_follows_word_gaps() {
        let input = tsv(&[
            "5\t1\t1\t1\t1\t1\t10\t10\t40\t20\t95\tItem",
            "5\t1\t1\t1\t1\t2\t200\t10\t40\t20\t95\tQty",
        ]);
        let spaced = parse_tsv_fragments(&input, true);
        assert_eq!(spaced.len(), 1);
        assert_eq!(spaced[0].text, format!("Item{}Qty", " ".repeat(13)));
        assert_eq!(spaced[0].bbox, BBox::new(10, 10, 240, 30));

        let collapsed = parse_tsv_fragments(&input, false);
        assert_eq!(collapsed[0].text, "Item Qty");
    }

    #[test]
    fn empty_output_has_no_fragments() {
        assert!(parse_tsv_fragments("", false).is_empty());
        assert!(parse_tsv_fragments(HEADER, true).is_empty());
    }
}
