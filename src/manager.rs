use crate::error::SetupError;
use crate::map::{default_map, Map};
use crate::participant::{guarded_call, Participant};
use crate::referee::{Referee, NUM_DESTINATIONS, NUM_DESTINATION_OPTIONS};

const MIN_PARTICIPANTS_PER_GAME: usize = 2;
const MAX_PARTICIPANTS_PER_GAME: usize = 8;

/// Runs a knock-out tournament: groups participants into games, runs each
/// through a [`Referee`], eliminates losers and cheaters, and repeats until
/// the field stops shrinking.
///
/// Holds its roster as `Vec<Option<Box<dyn Participant>>>` so a participant
/// can be lent out to a temporary, contiguous group for one round's
/// [`Referee`] (which borrows `&mut [Box<dyn Participant>]`) and handed back
/// afterward without the manager losing track of roster order.
pub struct Manager {
    roster: Vec<Option<Box<dyn Participant>>>,
    eliminated: Vec<usize>,
    banned: Vec<usize>,
    active: Vec<usize>,
    tournament_map: Map,
    rounds_without_change: usize,
    prev_active_count: usize,
}

impl Manager {
    /// Builds a tournament manager, notifying every participant via
    /// [`Participant::start`] and collecting their suggested maps. The first
    /// suggested map that is valid for the opening round's participant count
    /// is used; otherwise falls back to [`default_map`].
    ///
    /// Fails if fewer than two participants are supplied.
    pub fn new(mut roster: Vec<Box<dyn Participant>>) -> Result<Self, SetupError> {
        if roster.len() < MIN_PARTICIPANTS_PER_GAME {
            return Err(SetupError::TooFewParticipants { min: MIN_PARTICIPANTS_PER_GAME, got: roster.len() });
        }

        let opening_count = roster.len().min(MAX_PARTICIPANTS_PER_GAME);
        let mut suggested_maps = Vec::new();
        let mut banned = Vec::new();

        for (index, participant) in roster.iter_mut().enumerate() {
            match guarded_call(|| participant.start()) {
                Ok(map) => suggested_maps.push(map),
                Err(_) => {
                    log::warn!("participant {index} banned: threw during tournament start");
                    banned.push(index);
                }
            }
        }

        let tournament_map = suggested_maps
            .into_iter()
            .find(|map| map.has_enough_destinations(opening_count, NUM_DESTINATION_OPTIONS, NUM_DESTINATIONS))
            .unwrap_or_else(default_map);

        let active: Vec<usize> = (0..roster.len()).filter(|i| !banned.contains(i)).collect();
        let prev_active_count = active.len();

        Ok(Self {
            roster: roster.into_iter().map(Some).collect(),
            eliminated: Vec::new(),
            banned,
            active,
            tournament_map,
            rounds_without_change: 0,
            prev_active_count,
        })
    }

    /// Splits the active roster into games of 2-8 participants, in roster
    /// order. If the naive chunking would leave a single trailing
    /// participant without a game, one participant is pulled back from the
    /// previous group to leave two trailing groups of size >= 2 each.
    fn assign_games(&self) -> Vec<Vec<usize>> {
        if self.active.len() <= 1 {
            return Vec::new();
        }

        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();

        for &participant in &self.active {
            current.push(participant);
            if current.len() == MAX_PARTICIPANTS_PER_GAME {
                groups.push(std::mem::take(&mut current));
            }
        }

        if current.len() == MIN_PARTICIPANTS_PER_GAME - 1 {
            if let Some(last_group) = groups.last_mut() {
                let borrowed = last_group.pop().expect("a full group has participants to spare");
                current.insert(0, borrowed);
            }
        }

        if current.len() >= MIN_PARTICIPANTS_PER_GAME {
            groups.push(current);
        }

        groups
    }

    /// Runs one referee-driven game for each group, eliminating losers and
    /// banned participants from the active roster.
    fn run_round(&mut self, groups: Vec<Vec<usize>>) {
        for group in groups {
            let mut borrowed: Vec<Box<dyn Participant>> = group
                .iter()
                .map(|&index| self.roster[index].take().expect("participant is not already lent out"))
                .collect();

            let referee = match Referee::new(self.tournament_map.clone(), &mut borrowed, None) {
                Ok(referee) => referee,
                Err(err) => {
                    log::warn!("skipping a group this round: {err}");
                    for (participant, &index) in borrowed.into_iter().zip(&group) {
                        self.roster[index] = Some(participant);
                    }
                    continue;
                }
            };
            let (rankings, banned_in_group) = referee.play_game();

            for (participant, &index) in borrowed.into_iter().zip(&group) {
                self.roster[index] = Some(participant);
            }

            for losing_rank in rankings.iter().skip(1) {
                for &local_index in losing_rank {
                    let global_index = group[local_index];
                    self.eliminated.push(global_index);
                }
            }
            for &local_index in &banned_in_group {
                let global_index = group[local_index];
                self.banned.push(global_index);
            }
        }

        let removed: std::collections::HashSet<usize> =
            self.eliminated.iter().chain(self.banned.iter()).copied().collect();
        self.active.retain(|index| !removed.contains(index));
    }

    /// Two consecutive rounds producing no change in the number of active
    /// participants ends the tournament — a guard against an
    /// always-a-tie field looping forever.
    fn no_change_in_winners(&mut self) -> bool {
        if self.active.len() == self.prev_active_count {
            self.rounds_without_change += 1;
            self.rounds_without_change == 2
        } else {
            self.prev_active_count = self.active.len();
            self.rounds_without_change = 0;
            false
        }
    }

    fn main_loop(&mut self) {
        loop {
            let groups = self.assign_games();
            let game_count = groups.len();
            self.run_round(groups);
            if game_count <= 1 || self.no_change_in_winners() {
                break;
            }
        }
    }

    fn notify_results(&mut self) {
        for &index in self.active.clone().iter() {
            if let Some(participant) = &mut self.roster[index] {
                if guarded_call(|| participant.end(true)).is_err() {
                    log::warn!("participant {index} banned: threw during tournament end");
                    self.banned.push(index);
                }
            }
        }
        for &index in self.eliminated.clone().iter() {
            if let Some(participant) = &mut self.roster[index] {
                if guarded_call(|| participant.end(false)).is_err() {
                    log::warn!("participant {index} banned: threw during tournament end");
                    self.banned.push(index);
                }
            }
        }
    }

    /// Runs the full tournament to completion and returns the indices of
    /// surviving (winning) and banned participants, in roster order.
    pub fn run_tournament(mut self) -> (Vec<usize>, Vec<usize>) {
        self.main_loop();
        self.notify_results();

        let mut active = self.active.clone();
        active.sort_unstable();
        let mut banned = self.banned.clone();
        banned.sort_unstable();
        (active, banned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::destination::Destination;
    use crate::participant_state::ParticipantView;
    use crate::r#move::Move;
    use std::collections::HashMap as StdMap;
    use std::collections::HashSet;

    struct AlwaysDraw;

    impl Participant for AlwaysDraw {
        fn name(&self) -> String {
            "always-draw".to_string()
        }
        fn setup(&mut self, _map: &Map, _rails: u32, _cards: &StdMap<Color, u32>) {}
        fn pick(&mut self, options: &HashSet<Destination>) -> HashSet<Destination> {
            options.iter().take(options.len().saturating_sub(NUM_DESTINATIONS)).cloned().collect()
        }
        fn play(&mut self, _view: &ParticipantView) -> Move {
            Move::DrawCards
        }
        fn more(&mut self, _cards: &[Color]) {}
        fn win(&mut self, _won: bool) {}
        fn start(&mut self) -> Map {
            default_map()
        }
        fn end(&mut self, _won: bool) {}
    }

    #[test]
    fn assign_games_backtracks_a_trailing_singleton() {
        let roster: Vec<Box<dyn Participant>> = (0..9).map(|_| Box::new(AlwaysDraw) as Box<dyn Participant>).collect();
        let manager = Manager::new(roster).unwrap();
        let groups = manager.assign_games();
        let sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        assert_eq!(sizes, vec![7, 2]);
    }

    #[test]
    fn small_tournament_runs_to_completion() {
        let roster: Vec<Box<dyn Participant>> = (0..3).map(|_| Box::new(AlwaysDraw) as Box<dyn Participant>).collect();
        let manager = Manager::new(roster).unwrap();
        let (active, banned) = manager.run_tournament();
        assert!(banned.is_empty());
        assert!(!active.is_empty());
    }

    #[test]
    fn rejects_a_tournament_with_fewer_than_two_participants() {
        let roster: Vec<Box<dyn Participant>> = vec![Box::new(AlwaysDraw)];
        assert!(Manager::new(roster).is_err());
    }
}
