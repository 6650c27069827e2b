//! Format selection
//!
//! Picks a single rendition from a [`FormatCatalog`] for a requested media kind
//! and quality. Selection is pure and deterministic: every tie that survives the
//! stated ordering is broken by catalog order, first entry wins.
//!
//! Video with a requested quality `Q` is resolved in three tiers:
//! 1. exact `quality == Q`, largest size first
//! 2. otherwise the smallest quality that is still `>= Q`
//! 3. otherwise the highest quality available
//!
//! Audio always takes the largest size estimate.

use crate::error::{Error, Result};
use crate::types::{FormatCatalog, FormatDescriptor, MediaKind, SelectionRequest};
use std::cmp::Ordering;

/// Select the rendition that best satisfies `request`
///
/// # Errors
///
/// Returns [`Error::NoMatch`] when the catalog has no descriptor of the
/// requested media kind.
pub fn select<'a>(
    catalog: &'a FormatCatalog,
    request: SelectionRequest,
) -> Result<&'a FormatDescriptor> {
    let candidates: Vec<&FormatDescriptor> = catalog
        .iter()
        .filter(|f| f.media_kind == request.media_kind)
        .collect();

    let chosen = match request.media_kind {
        MediaKind::Audio => first_max_by(&candidates, by_size),
        MediaKind::Video => match request.desired_quality {
            None => first_max_by(&candidates, by_quality_then_size),
            Some(quality) => select_video_at(&candidates, quality),
        },
    };

    chosen.ok_or(Error::NoMatch {
        kind: request.media_kind,
        quality: request.desired_quality,
    })
}

fn select_video_at<'a>(
    candidates: &[&'a FormatDescriptor],
    quality: u32,
) -> Option<&'a FormatDescriptor> {
    let exact: Vec<&FormatDescriptor> = candidates
        .iter()
        .copied()
        .filter(|f| f.quality_rank == quality)
        .collect();
    if let Some(found) = first_max_by(&exact, by_size) {
        return Some(found);
    }

    let above: Vec<&FormatDescriptor> = candidates
        .iter()
        .copied()
        .filter(|f| f.quality_rank >= quality)
        .collect();
    // Smallest sufficient upgrade: reversing the comparison turns "max" into "min"
    if let Some(found) = first_max_by(&above, |a, b| b.quality_rank.cmp(&a.quality_rank)) {
        return Some(found);
    }

    first_max_by(candidates, by_quality_then_size)
}

fn by_size(a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
    a.size_hint.cmp(&b.size_hint)
}

fn by_quality_then_size(a: &FormatDescriptor, b: &FormatDescriptor) -> Ordering {
    a.quality_rank
        .cmp(&b.quality_rank)
        .then_with(|| a.size_hint.cmp(&b.size_hint))
}

/// Greatest element under `cmp`; on equality the earlier element is kept.
///
/// `Iterator::max_by` returns the *last* maximum, which would break the
/// catalog-order tie rule.
fn first_max_by<'a, F>(items: &[&'a FormatDescriptor], cmp: F) -> Option<&'a FormatDescriptor>
where
    F: Fn(&FormatDescriptor, &FormatDescriptor) -> Ordering,
{
    items.iter().copied().fold(None, |best, item| match best {
        Some(current) if cmp(item, current) != Ordering::Greater => Some(current),
        _ => Some(item),
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, quality: u32, size: u64) -> FormatDescriptor {
        FormatDescriptor::new(id, "mp4", MediaKind::Video, quality, size)
    }

    fn audio(id: &str, size: u64) -> FormatDescriptor {
        FormatDescriptor::new(id, "m4a", MediaKind::Audio, 0, size)
    }

    fn want_video(quality: Option<u32>) -> SelectionRequest {
        SelectionRequest {
            media_kind: MediaKind::Video,
            desired_quality: quality,
        }
    }

    fn want_audio() -> SelectionRequest {
        SelectionRequest {
            media_kind: MediaKind::Audio,
            desired_quality: None,
        }
    }

    #[test]
    fn exact_quality_is_selected() {
        let catalog = FormatCatalog::new(vec![
            video("480", 480, 10),
            video("720", 720, 20),
            video("1080", 1080, 30),
        ]);

        let chosen = select(&catalog, want_video(Some(720))).unwrap();
        assert_eq!(chosen.format_id, "720");
    }

    #[test]
    fn smallest_upgrade_preferred_over_downgrade() {
        let catalog = FormatCatalog::new(vec![video("480", 480, 10), video("1080", 1080, 30)]);

        let chosen = select(&catalog, want_video(Some(720))).unwrap();
        assert_eq!(chosen.format_id, "1080");
    }

    #[test]
    fn falls_back_to_highest_when_everything_is_below() {
        let catalog = FormatCatalog::new(vec![video("240", 240, 10), video("360", 360, 5)]);

        let chosen = select(&catalog, want_video(Some(720))).unwrap();
        assert_eq!(chosen.format_id, "360");
    }

    #[test]
    fn exact_matches_tie_break_on_size_then_order() {
        let catalog = FormatCatalog::new(vec![
            video("small", 720, 10),
            video("big-first", 720, 50),
            video("big-second", 720, 50),
        ]);

        let chosen = select(&catalog, want_video(Some(720))).unwrap();
        assert_eq!(chosen.format_id, "big-first");
    }

    #[test]
    fn upgrade_tier_prefers_catalog_order_on_equal_quality() {
        let catalog = FormatCatalog::new(vec![
            video("2160", 2160, 90),
            video("1080-a", 1080, 10),
            video("1080-b", 1080, 99),
        ]);

        let chosen = select(&catalog, want_video(Some(900))).unwrap();
        assert_eq!(
            chosen.format_id, "1080-a",
            "upgrade tier only orders by quality, then catalog order"
        );
    }

    #[test]
    fn best_video_uses_quality_then_size_then_order() {
        let catalog = FormatCatalog::new(vec![
            video("720", 720, 999),
            video("1080-small", 1080, 10),
            video("1080-big", 1080, 20),
            video("1080-big-dup", 1080, 20),
        ]);

        let chosen = select(&catalog, want_video(None)).unwrap();
        assert_eq!(chosen.format_id, "1080-big");
    }

    #[test]
    fn audio_picks_largest_size_first_on_ties() {
        let catalog = FormatCatalog::new(vec![
            video("1080", 1080, 1_000_000),
            audio("low", 100),
            audio("high-a", 300),
            audio("high-b", 300),
        ]);

        let chosen = select(&catalog, want_audio()).unwrap();
        assert_eq!(chosen.format_id, "high-a");
    }

    #[test]
    fn audio_ignores_desired_quality() {
        let catalog = FormatCatalog::new(vec![audio("a", 1), audio("b", 2)]);
        let request = SelectionRequest {
            media_kind: MediaKind::Audio,
            desired_quality: Some(1080),
        };

        assert_eq!(select(&catalog, request).unwrap().format_id, "b");
    }

    #[test]
    fn no_descriptor_of_kind_is_no_match() {
        let only_audio = FormatCatalog::new(vec![audio("a", 1)]);
        let err = select(&only_audio, want_video(Some(720))).unwrap_err();
        assert!(matches!(
            err,
            Error::NoMatch {
                kind: MediaKind::Video,
                quality: Some(720)
            }
        ));

        let only_video = FormatCatalog::new(vec![video("v", 720, 1)]);
        assert!(matches!(
            select(&only_video, want_audio()),
            Err(Error::NoMatch { .. })
        ));

        let empty = FormatCatalog::default();
        assert!(select(&empty, want_video(None)).is_err());
        assert!(select(&empty, want_audio()).is_err());
    }

    #[test]
    fn video_selection_never_fails_for_any_requested_quality() {
        let catalog = FormatCatalog::new(vec![
            video("360", 360, 3),
            video("720", 720, 7),
            video("1080", 1080, 10),
        ]);
        let qualities: Vec<u32> = catalog.iter().map(|f| f.quality_rank).collect();

        for q in [0, 144, 360, 500, 720, 900, 1080, 1440, 4320, u32::MAX] {
            let chosen = select(&catalog, want_video(Some(q))).unwrap();

            if qualities.contains(&q) {
                assert_eq!(chosen.quality_rank, q, "exact match for {q}");
            } else if let Some(min_above) = qualities.iter().copied().filter(|&x| x >= q).min() {
                assert_eq!(chosen.quality_rank, min_above, "smallest upgrade for {q}");
            } else {
                assert_eq!(chosen.quality_rank, 1080, "fallback to max for {q}");
            }
        }
    }

    #[test]
    fn unknown_quality_zero_is_still_selectable() {
        let catalog = FormatCatalog::new(vec![video("unknown", 0, 5)]);

        assert_eq!(
            select(&catalog, want_video(Some(720))).unwrap().format_id,
            "unknown"
        );
        assert_eq!(
            select(&catalog, want_video(Some(0))).unwrap().format_id,
            "unknown"
        );
    }
}
