use card_scrub_inpaint::Mask;
use card_scrub_types::PixelRect;
use tracing::debug;

use super::matcher::MatchedRegion;
use crate::settings::{DilationSettings, Padding};

/// Grows every matched rectangle by the configured padding, clamped to the
/// image.
pub fn pad_regions(
    regions: &[MatchedRegion],
    padding: Padding,
    width: u32,
    height: u32,
) -> Vec<PixelRect> {
    regions
        .iter()
        .map(|region| {
            region
                .rect
                .expand(padding.horizontal, padding.vertical, width, height)
        })
        .filter(|rect| !rect.is_empty())
        .collect()
}

/// Repeatedly merges rectangles that overlap or lie within `threshold`
/// pixels of each other until no pair qualifies. A threshold of 0 leaves
/// the input untouched.
pub fn combine_close(mut rects: Vec<PixelRect>, threshold: u32) -> Vec<PixelRect> {
    if threshold == 0 || rects.len() < 2 {
        return rects;
    }
    loop {
        let mut merged_any = false;
        let mut used = vec![false; rects.len()];
        let mut next = Vec::with_capacity(rects.len());
        for i in 0..rects.len() {
            if used[i] {
                continue;
            }
            let mut current = rects[i];
            for j in (i + 1)..rects.len() {
                if used[j] || current.gap_to(&rects[j]) > threshold {
                    continue;
                }
                current = current.union(&rects[j]);
                used[j] = true;
                merged_any = true;
            }
            used[i] = true;
            next.push(current);
        }
        rects = next;
        if !merged_any {
            return rects;
        }
    }
}

/// Padded and (optionally) combined rectangles for one image.
pub fn plan_regions(
    regions: &[MatchedRegion],
    padding: Padding,
    combine_threshold: u32,
    width: u32,
    height: u32,
) -> Vec<PixelRect> {
    let padded = pad_regions(regions, padding, width, height);
    let planned = combine_close(padded, combine_threshold);
    debug!(
        matched = regions.len(),
        rects = planned.len(),
        "planned mask rectangles"
    );
    planned
}

pub fn build_mask(
    rects: &[PixelRect],
    width: u32,
    height: u32,
    dilation: &DilationSettings,
) -> Mask {
    let mut mask = Mask::from_rects(width, height, rects);
    if dilation.enabled {
        mask.dilate(dilation.kernel, dilation.iterations);
    }
    mask
}
