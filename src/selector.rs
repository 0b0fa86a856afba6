//! Picks the image for this run.
//!
//! Both strategies are pure: they take the pool and the cursor state and hand
//! back the choice plus the state to persist. Nothing here touches disk, so a
//! failed run can't leave the cursor half-updated.

use crate::cursor::UsedImages;
use crate::error::SelectError;
use crate::pool::ImageId;

/// How the choice was reached, for the run log.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SelectionEvent {
    /// Normal step to the next image.
    Advanced,
    /// Every pool member had been used, so the cycle started over.
    CycleReset,
    /// Pointer mode with no previous record; started from the first image.
    NoPrevious,
    /// Pointer mode, but the previous image has left the pool; started from the first image.
    PreviousMissing,
}

/// The chosen image and the history to save once the run succeeds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Selection {
    /// Image to process this run.
    pub image: ImageId,
    /// How it was chosen.
    pub event: SelectionEvent,
    /// Updated history. Always empty from [`select_after`]; pointer mode keeps no history.
    pub used: UsedImages,
}

impl Selection {
    /// True when the history was cleared to pick this image.
    pub fn is_reset(&self) -> bool {
        self.event == SelectionEvent::CycleReset
    }
}

/// First pool image not yet used this cycle, resetting the cycle when none are left.
///
/// `pool` must already be sorted; see [`crate::pool::build_pool`].
pub fn select_next(pool: &[ImageId], used: &UsedImages) -> Result<Selection, SelectError> {
    let first = pool.first().ok_or(SelectError::EmptyPool)?;

    let (image, event, mut used) = match pool.iter().find(|image| !used.contains(image)) {
        Some(image) => (image, SelectionEvent::Advanced, used.clone()),
        None => (first, SelectionEvent::CycleReset, UsedImages::default()),
    };
    used.push(image);

    Ok(Selection {
        image: image.clone(),
        event,
        used,
    })
}

/// Image after `last` in pool order, wrapping at the end.
pub fn select_after(pool: &[ImageId], last: Option<&ImageId>) -> Result<Selection, SelectError> {
    let first = pool.first().ok_or(SelectError::EmptyPool)?;

    let (image, event) = match last {
        None => (first, SelectionEvent::NoPrevious),
        Some(last) => match pool.iter().position(|image| image == last) {
            Some(index) => (&pool[(index + 1) % pool.len()], SelectionEvent::Advanced),
            None => (first, SelectionEvent::PreviousMissing),
        },
    };

    Ok(Selection {
        image: image.clone(),
        event,
        used: UsedImages::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::build_pool;

    fn id(name: &str) -> ImageId {
        ImageId::from_file_name(name).expect("valid image name")
    }

    fn abc() -> Vec<ImageId> {
        build_pool(["c.jpeg", "a.jpg", "b.png"])
    }

    #[test]
    fn empty_history_picks_the_first_image() {
        let selection = select_next(&abc(), &UsedImages::default()).expect("select");
        assert_eq!(selection.image, id("a.jpg"));
        assert_eq!(selection.event, SelectionEvent::Advanced);
        assert_eq!(selection.used.names(), ["a.jpg"]);
    }

    #[test]
    fn full_cycle_visits_each_image_once_in_order() {
        let pool = build_pool(["e.png", "b.jpg", "d.jpeg", "a.jpg", "c.png"]);
        let mut used = UsedImages::default();
        let mut visited = Vec::new();
        for _ in 0..pool.len() {
            let selection = select_next(&pool, &used).expect("select");
            assert!(!selection.is_reset());
            visited.push(selection.image);
            used = selection.used;
        }
        assert_eq!(visited, pool);
    }

    #[test]
    fn one_past_a_full_cycle_resets_once() {
        let pool = abc();
        let mut used = UsedImages::default();
        let mut picks = Vec::new();
        let mut resets = 0;
        for _ in 0..=pool.len() {
            let selection = select_next(&pool, &used).expect("select");
            if selection.is_reset() {
                resets += 1;
            }
            picks.push(selection.image);
            used = selection.used;
        }
        assert_eq!(resets, 1);
        assert_eq!(picks.last(), picks.first());
        assert_eq!(used.names(), ["a.jpg"]);
    }

    #[test]
    fn history_end_to_end_scenario() {
        let pool = abc();

        let first = select_next(&pool, &UsedImages::default()).expect("run 1");
        assert_eq!(first.image, id("a.jpg"));
        assert_eq!(first.used.names(), ["a.jpg"]);

        let second = select_next(&pool, &first.used).expect("run 2");
        assert_eq!(second.image, id("b.png"));
        assert_eq!(second.used.names(), ["a.jpg", "b.png"]);

        let third = select_next(&pool, &second.used).expect("run 3");
        assert_eq!(third.image, id("c.jpeg"));

        let fourth = select_next(&pool, &third.used).expect("run 4");
        assert_eq!(fourth.image, id("a.jpg"));
        assert_eq!(fourth.event, SelectionEvent::CycleReset);
        assert_eq!(fourth.used.names(), ["a.jpg"]);
    }

    #[test]
    fn stale_history_entries_are_skipped_not_pruned() {
        let pool = abc();
        let used: UsedImages = ["gone.jpg", "a.jpg"].into_iter().collect();
        let selection = select_next(&pool, &used).expect("select");
        assert_eq!(selection.image, id("b.png"));
        assert_eq!(selection.used.names(), ["gone.jpg", "a.jpg", "b.png"]);
    }

    #[test]
    fn history_of_only_removed_images_starts_from_the_top() {
        let pool = abc();
        let used: UsedImages = ["x.jpg", "y.png"].into_iter().collect();
        let selection = select_next(&pool, &used).expect("select");
        assert_eq!(selection.image, id("a.jpg"));
        assert_eq!(selection.event, SelectionEvent::Advanced);
    }

    #[test]
    fn new_images_join_the_current_cycle() {
        let used: UsedImages = ["a.jpg", "b.png", "c.jpeg"].into_iter().collect();
        let grown = build_pool(["a.jpg", "b.png", "c.jpeg", "aa.png"]);
        let selection = select_next(&grown, &used).expect("select");
        assert_eq!(selection.image, id("aa.png"));
        assert!(!selection.is_reset());
    }

    #[test]
    fn empty_pool_is_reported() {
        let used: UsedImages = ["a.jpg"].into_iter().collect();
        assert_eq!(select_next(&[], &used), Err(SelectError::EmptyPool));
        assert_eq!(select_after(&[], Some(&id("a.jpg"))), Err(SelectError::EmptyPool));
    }

    #[test]
    fn pointer_steps_to_the_next_image() {
        let pool = abc();
        let selection = select_after(&pool, Some(&id("b.png"))).expect("select");
        assert_eq!(selection.image, id("c.jpeg"));
        assert_eq!(selection.event, SelectionEvent::Advanced);
        assert!(selection.used.is_empty());
    }

    #[test]
    fn pointer_wraps_at_the_end() {
        let selection = select_after(&abc(), Some(&id("c.jpeg"))).expect("select");
        assert_eq!(selection.image, id("a.jpg"));
        assert_eq!(selection.event, SelectionEvent::Advanced);
    }

    #[test]
    fn pointer_falls_back_to_the_first_image() {
        let without_b = build_pool(["a.jpg", "c.jpeg"]);
        let selection = select_after(&without_b, Some(&id("b.png"))).expect("select");
        assert_eq!(selection.image, id("a.jpg"));
        assert_eq!(selection.event, SelectionEvent::PreviousMissing);

        let selection = select_after(&abc(), None).expect("select");
        assert_eq!(selection.image, id("a.jpg"));
        assert_eq!(selection.event, SelectionEvent::NoPrevious);
    }
}
