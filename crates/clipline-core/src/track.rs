// crates/clipline-core/src/track.rs
//
// A horizontal lane of clips. Items keep insertion order (not time order);
// the first-fit scan depends on that order.

use crate::clip::{Clip, ClipId, Interval};

#[derive(Clone, Debug, Default)]
pub struct Track {
    items: Vec<Clip>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Clip] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// End of the last-ending clip, or 0 for an empty track.
    pub fn end(&self) -> f64 {
        self.items.iter().map(Clip::end).fold(0.0_f64, f64::max)
    }

    /// Left-packed slot for a clip of `duration` seconds.
    ///
    /// Walks items once in insertion order, pushing the candidate start to the
    /// end of every item it collides with. If the final candidate still
    /// collides with anything (possible when items are not in time order) the
    /// track is treated as full and `None` is returned.
    pub fn first_fit(&self, duration: f64) -> Option<f64> {
        let mut pos = 0.0_f64;
        for item in &self.items {
            if Interval::new(pos, duration).intersects(&item.interval()) {
                pos = item.end();
            }
        }
        let candidate = Interval::new(pos, duration);
        if self.items.iter().any(|c| candidate.intersects(&c.interval())) {
            return None;
        }
        Some(pos)
    }

    /// First item intersecting `interval`, ignoring `except`.
    pub fn overlapping(&self, interval: &Interval, except: Option<ClipId>) -> Option<&Clip> {
        self.items.iter()
            .filter(|c| Some(c.id()) != except)
            .find(|c| c.interval().intersects(interval))
    }

    pub fn position(&self, id: ClipId) -> Option<usize> {
        self.items.iter().position(|c| c.id() == id)
    }

    pub fn get(&self, id: ClipId) -> Option<&Clip> {
        self.items.iter().find(|c| c.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: ClipId) -> Option<&mut Clip> {
        self.items.iter_mut().find(|c| c.id() == id)
    }

    pub(crate) fn push(&mut self, clip: Clip) {
        self.items.push(clip);
    }

    pub(crate) fn remove(&mut self, id: ClipId) -> Option<Clip> {
        let pos = self.position(id)?;
        Some(self.items.remove(pos))
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<Clip> {
        &mut self.items
    }

    /// True when no two items intersect.
    pub fn is_consistent(&self) -> bool {
        self.items.iter().enumerate().all(|(i, a)| {
            self.items[i + 1..].iter().all(|b| !a.interval().intersects(&b.interval()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_at(duration: f64, offset: f64) -> Clip {
        let mut c = Clip::new("t.mp4", duration);
        c.offset = offset;
        c
    }

    #[test]
    fn empty_track_fits_at_zero() {
        assert_eq!(Track::new().first_fit(7.0), Some(0.0));
    }

    #[test]
    fn contiguous_items_pack_to_the_end() {
        let mut t = Track::new();
        t.push(clip_at(5.0, 0.0));
        t.push(clip_at(3.0, 5.0));
        assert_eq!(t.first_fit(4.0), Some(8.0));
        assert_eq!(t.end(), 8.0);
    }

    #[test]
    fn leading_gap_is_used_when_it_fits() {
        let mut t = Track::new();
        t.push(clip_at(5.0, 10.0));
        assert_eq!(t.first_fit(4.0), Some(0.0));
        assert_eq!(t.first_fit(10.0), Some(0.0));
    }

    #[test]
    fn out_of_order_items_can_fill_a_track() {
        // Insertion order: later clip first. The single forward scan bumps
        // past [0,5) into [5,11), which then hits the clip at [10,15).
        let mut t = Track::new();
        t.push(clip_at(5.0, 10.0));
        t.push(clip_at(5.0, 0.0));
        assert_eq!(t.first_fit(6.0), None);
        // A short clip still fits in the [5,10) gap.
        assert_eq!(t.first_fit(5.0), Some(5.0));
    }

    #[test]
    fn overlapping_skips_the_excluded_clip() {
        let mut t = Track::new();
        let a = clip_at(5.0, 0.0);
        let a_id = a.id();
        t.push(a);
        let probe = Interval::new(2.0, 1.0);
        assert!(t.overlapping(&probe, None).is_some());
        assert!(t.overlapping(&probe, Some(a_id)).is_none());
    }

    #[test]
    fn consistency_check_detects_overlap() {
        let mut t = Track::new();
        t.push(clip_at(5.0, 0.0));
        t.push(clip_at(5.0, 5.0));
        assert!(t.is_consistent());
        t.push(clip_at(1.0, 9.0));
        assert!(!t.is_consistent());
    }
}
