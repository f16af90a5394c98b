//! The per-agent, per-turn timeline
//!
//! A timeline is an ordered, capacity-bounded set of time slots in the
//! tick domain [0, 1). Two slots may overlap in time only when their
//! channel sets are disjoint: you cannot swing and thrust with the same
//! hand simultaneously, but footwork runs in parallel with either.
//! Intervals are half-open, so a slot ending exactly where another starts
//! never conflicts.

use arrayvec::ArrayVec;

use crate::content::template::Channels;
use crate::core::arena::CardId;
use crate::core::error::ScheduleError;
use crate::schedule::play::Play;

/// Slot cap per agent per turn; a deliberate gameplay constraint
pub const TIMELINE_CAPACITY: usize = 12;

/// Start times snap down to this grid
pub const GRANULARITY: f32 = 0.1;

/// Tolerance for float comparisons on the [0, 1) grid
const EPS: f32 = 1e-4;

/// Snap a time down to the granularity grid; idempotent
pub fn snap(time: f32) -> f32 {
    ((time + EPS) / GRANULARITY).floor() * GRANULARITY
}

/// A play anchored at a start time; duration and end are derived from the
/// play's current cost so modifier changes are always reflected
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot {
    pub play: Play,
    pub time_start: f32,
}

impl TimeSlot {
    pub fn time_end(&self) -> f32 {
        self.time_start + self.play.duration()
    }

    /// Half-open interval overlap against [start, end)
    pub fn overlaps(&self, start: f32, end: f32) -> bool {
        self.time_end() > start + EPS && self.time_start < end - EPS
    }
}

/// Ordered, bounded schedule of one agent's plays within a tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    slots: ArrayVec<TimeSlot, TIMELINE_CAPACITY>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether [start, end) with the given channels would be accepted
    pub fn can_insert(&self, start: f32, end: f32, channels: Channels) -> bool {
        if self.slots.is_full() {
            return false;
        }
        if start < -EPS || end > 1.0 + EPS {
            return false;
        }
        !self.slots.iter().any(|slot| {
            slot.play.channels().intersects(channels) && slot.overlaps(start, end)
        })
    }

    /// Place a play at the snapped start time, keeping ascending order
    pub fn insert(&mut self, play: Play, time_start: f32) -> Result<(), ScheduleError> {
        let start = snap(time_start);
        let end = start + play.duration();

        if self.slots.is_full() || end > 1.0 + EPS {
            return Err(ScheduleError::Overflow);
        }
        let channels = play.channels();
        if self
            .slots
            .iter()
            .any(|slot| slot.play.channels().intersects(channels) && slot.overlaps(start, end))
        {
            return Err(ScheduleError::Conflict);
        }

        let index = self
            .slots
            .iter()
            .position(|slot| slot.time_start > start)
            .unwrap_or(self.slots.len());
        self.slots.insert(
            index,
            TimeSlot {
                play,
                time_start: start,
            },
        );
        Ok(())
    }

    /// First grid-aligned start that accepts the duration, scanning from
    /// zero; `None` when nothing fits before the tick boundary
    pub fn next_available_start(&self, channels: Channels, duration: f32) -> Option<f32> {
        let mut step = 0u32;
        loop {
            let candidate = step as f32 * GRANULARITY;
            if candidate + duration > 1.0 + EPS {
                return None;
            }
            if self.can_insert(candidate, candidate + duration, channels) {
                return Some(candidate);
            }
            step += 1;
        }
    }

    pub fn find_play(&self, card: CardId) -> Option<&Play> {
        self.slots
            .iter()
            .map(|slot| &slot.play)
            .find(|play| play.card == card)
    }

    pub fn find_play_mut(&mut self, card: CardId) -> Option<&mut Play> {
        self.slots
            .iter_mut()
            .map(|slot| &mut slot.play)
            .find(|play| play.card == card)
    }

    pub fn find_slot(&self, card: CardId) -> Option<&TimeSlot> {
        self.slots.iter().find(|slot| slot.play.card == card)
    }

    /// Remove the slot led by `card`, returning the play
    pub fn remove_play(&mut self, card: CardId) -> Option<Play> {
        let index = self.slots.iter().position(|slot| slot.play.card == card)?;
        Some(self.slots.remove(index).play)
    }

    /// Re-check a slot against its neighbors after its duration changed;
    /// used when stacking extends a play
    pub fn still_fits(&self, card: CardId) -> Result<(), ScheduleError> {
        let Some(slot) = self.find_slot(card) else {
            return Ok(());
        };
        let start = slot.time_start;
        let end = slot.time_end();
        if end > 1.0 + EPS {
            return Err(ScheduleError::Overflow);
        }
        let channels = slot.play.channels();
        let collides = self.slots.iter().any(|other| {
            other.play.card != card
                && other.play.channels().intersects(channels)
                && other.overlaps(start, end)
        });
        if collides {
            Err(ScheduleError::Conflict)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::template::{Template, TemplateId};
    use crate::core::arena::{Arena, CardId};
    use crate::schedule::play::Play;

    fn play_from(template: &Template) -> Play {
        let mut cards: Arena<u8> = Arena::new();
        Play::new(CardId(cards.insert(0)), TemplateId(0), template)
    }

    fn weapon_play() -> Play {
        play_from(&Template::cut()) // weapon channel, duration 0.2
    }

    fn footwork_play() -> Play {
        play_from(&Template::sidestep()) // footwork channel, duration 0.2
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut timeline = Timeline::new();
        timeline.insert(weapon_play(), 0.6).unwrap();
        timeline.insert(weapon_play(), 0.0).unwrap();
        timeline.insert(weapon_play(), 0.3).unwrap();

        let starts: Vec<f32> = timeline.slots().iter().map(|s| s.time_start).collect();
        assert!(starts.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_same_channel_overlap_conflicts_both_ways() {
        let mut forward = Timeline::new();
        forward.insert(weapon_play(), 0.0).unwrap();
        assert_eq!(
            forward.insert(weapon_play(), 0.1),
            Err(ScheduleError::Conflict)
        );

        let mut reverse = Timeline::new();
        reverse.insert(weapon_play(), 0.1).unwrap();
        assert_eq!(
            reverse.insert(weapon_play(), 0.0),
            Err(ScheduleError::Conflict)
        );
    }

    #[test]
    fn test_disjoint_channels_overlap_freely() {
        let mut timeline = Timeline::new();
        timeline.insert(weapon_play(), 0.0).unwrap();
        timeline.insert(footwork_play(), 0.0).unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_adjacent_slots_do_not_conflict() {
        let mut timeline = Timeline::new();
        timeline.insert(weapon_play(), 0.0).unwrap();
        // Previous slot ends exactly at 0.2
        timeline.insert(weapon_play(), 0.2).unwrap();
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_snap_truncates_and_is_idempotent() {
        assert!((snap(0.27) - 0.2).abs() < 1e-6);
        assert!((snap(0.3) - 0.3).abs() < 1e-6);
        assert!((snap(snap(0.27)) - snap(0.27)).abs() < 1e-6);

        let mut timeline = Timeline::new();
        timeline.insert(weapon_play(), 0.27).unwrap();
        assert!((timeline.slots()[0].time_start - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_play_cannot_spill_past_tick_boundary() {
        let mut timeline = Timeline::new();
        // Duration 0.2 starting at 0.9 would end at 1.1
        assert_eq!(
            timeline.insert(weapon_play(), 0.9),
            Err(ScheduleError::Overflow)
        );
        // Ending exactly at 1.0 is fine
        timeline.insert(weapon_play(), 0.8).unwrap();
    }

    #[test]
    fn test_capacity_overflow() {
        let mut timeline = Timeline::new();
        // Tile each channel sequentially to fill all twelve slots
        for i in 0..5 {
            timeline.insert(footwork_play(), i as f32 * 0.2).unwrap();
        }
        for i in 0..5 {
            timeline.insert(weapon_play(), i as f32 * 0.2).unwrap();
        }
        // 10 slots in; two off-hand blocks fit at 0.0 and 0.3
        let off_hand = play_from(&Template::high_block());
        timeline.insert(off_hand.clone(), 0.0).unwrap();
        timeline.insert(off_hand.clone(), 0.3).unwrap();
        assert_eq!(timeline.len(), TIMELINE_CAPACITY);

        assert_eq!(
            timeline.insert(off_hand, 0.6),
            Err(ScheduleError::Overflow)
        );
    }

    #[test]
    fn test_next_available_start_finds_the_gap() {
        let mut timeline = Timeline::new();
        timeline.insert(weapon_play(), 0.0).unwrap();
        timeline.insert(weapon_play(), 0.4).unwrap();

        let channels = weapon_play().channels();
        let start = timeline.next_available_start(channels, 0.2).unwrap();
        assert!((start - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_next_available_start_none_when_tiled() {
        let mut timeline = Timeline::new();
        for i in 0..5 {
            timeline.insert(weapon_play(), i as f32 * 0.2).unwrap();
        }

        let channels = weapon_play().channels();
        assert_eq!(timeline.next_available_start(channels, 0.2), None);
        // A disjoint channel still finds room
        let footwork = footwork_play().channels();
        assert_eq!(timeline.next_available_start(footwork, 0.2), Some(0.0));
    }

    #[test]
    fn test_remove_play_frees_the_slot() {
        let mut timeline = Timeline::new();
        let play = weapon_play();
        let card = play.card;
        timeline.insert(play, 0.0).unwrap();

        assert!(timeline.remove_play(card).is_some());
        assert!(timeline.is_empty());
        assert!(timeline.remove_play(card).is_none());
    }

    // === Property tests: the scheduler's algebraic laws ===

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_snap_is_idempotent_and_never_rounds_up(t in 0.0f32..1.0) {
                let once = snap(t);
                prop_assert!((snap(once) - once).abs() < 1e-6);
                prop_assert!(once <= t + 1e-4);
            }

            #[test]
            fn prop_conflict_symmetry(a in 0u32..=8, b in 0u32..=8) {
                let start_a = a as f32 * GRANULARITY;
                let start_b = b as f32 * GRANULARITY;

                let mut holds_a = Timeline::new();
                holds_a.insert(weapon_play(), start_a).unwrap();
                let mut holds_b = Timeline::new();
                holds_b.insert(weapon_play(), start_b).unwrap();

                let channels = weapon_play().channels();
                let forward = holds_a.can_insert(start_b, start_b + 0.2, channels);
                let backward = holds_b.can_insert(start_a, start_a + 0.2, channels);
                prop_assert_eq!(forward, backward);

                // Duration 0.2 on a 0.1 grid: overlap iff within one step
                let expected = (a as i32 - b as i32).abs() >= 2;
                prop_assert_eq!(forward, expected);

                // Disjoint channels ignore time overlap entirely
                let footwork = footwork_play().channels();
                prop_assert!(holds_a.can_insert(start_b, start_b + 0.2, footwork));
            }

            #[test]
            fn prop_adjacent_slots_never_conflict(a in 0u32..=6) {
                let start = a as f32 * GRANULARITY;
                let mut timeline = Timeline::new();
                timeline.insert(weapon_play(), start).unwrap();

                let end = timeline.slots()[0].time_end();
                let channels = weapon_play().channels();
                prop_assert!(timeline.can_insert(end, end + 0.2, channels));
            }
        }
    }

    #[test]
    fn test_still_fits_detects_grown_duration() {
        use crate::content::template::ModifyPlay;
        use crate::schedule::play::ModifierSlot;

        // Distinct card ids so still_fits can tell the slots apart
        let mut cards: Arena<u8> = Arena::new();
        let lead = Play::new(CardId(cards.insert(0)), TemplateId(0), &Template::cut());
        let other = Play::new(CardId(cards.insert(0)), TemplateId(0), &Template::cut());
        let lead_card = lead.card;

        let mut timeline = Timeline::new();
        timeline.insert(lead, 0.0).unwrap();
        timeline.insert(other, 0.2).unwrap();
        assert!(timeline.still_fits(lead_card).is_ok());

        // Stretch the first play from 0.2 to 0.3; it now overlaps the next
        let mut cards: Arena<u8> = Arena::new();
        timeline
            .find_play_mut(lead_card)
            .unwrap()
            .add_modifier(ModifierSlot {
                card: CardId(cards.insert(0)),
                template: TemplateId(1),
                effect: ModifyPlay {
                    cost_mult: 1.5,
                    ..Default::default()
                },
            })
            .unwrap();

        assert_eq!(timeline.still_fits(lead_card), Err(ScheduleError::Conflict));
    }
}
