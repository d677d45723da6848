use crate::ocr::BBox;

pub(super) fn union_bbox(a: &BBox, b: &BBox) -> BBox {
    BBox {
        x0: a.x0.min(b.x0),
        y0: a.y0.min(b.y0),
        x1: a.x1.max(b.x1),
        y1: a.y1.max(b.y1),
    }
}

/// Tesseract reports `left, top, width, height`.
pub(super) fn bbox_from_ltwh(left: u32, top: u32, width: u32, height: u32) -> BBox {
    BBox {
        x0: left,
        y0: top,
        x1: left.saturating_add(width),
        y1: top.saturating_add(height),
    }
}
