use crate::connection::Connection;
use crate::deck::Deck;
use crate::destination::Destination;
use crate::error::SetupError;
use crate::map::Map;
use crate::participant::{guarded_call, Participant};
use crate::participant_state::{ParticipantGameState, ParticipantView};
use crate::r#move::{ApplyVisitor, Move};
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::{HashMap, HashSet};

pub const INITIAL_RAIL_COUNT: u32 = 45;
pub const CARDS_ON_DRAW: usize = 2;
pub const INITIAL_DECK_SIZE: usize = 250;
pub const INITIAL_HAND_SIZE: usize = 4;
pub const NUM_DESTINATIONS: usize = 2;
pub const NUM_DESTINATION_OPTIONS: usize = 5;
pub const MIN_RAILS_TO_NOT_TRIGGER_LAST_TURN: u32 = 3;
pub const MIN_PARTICIPANTS: usize = 2;
pub const MAX_PARTICIPANTS: usize = 8;

const RAIL_SEGMENT_POINTS: i64 = 1;
const DESTINATION_POINTS: i64 = 10;
const LONGEST_PATH_POINTS: i64 = 20;

/// The mutable, authoritative record of a game in progress: the map, the
/// draw pile, every participant's private state, and whose turn it is.
///
/// This is the state a [`Move`] is legality-checked and applied against; it
/// has no knowledge of bans or of the participants themselves, which the
/// owning [`Referee`] tracks separately.
pub struct RefereeState {
    pub map: Map,
    pub deck: Deck,
    pub participants: Vec<ParticipantGameState>,
    pub turn: usize,
}

impl RefereeState {
    /// The participant index whose turn it currently is.
    pub fn current_turn(&self) -> usize {
        self.turn
    }

    /// Connections on the map no participant currently owns.
    pub fn free_connections(&self) -> HashSet<Connection> {
        let owned: HashSet<&Connection> = self.participants.iter().flat_map(|p| p.owned.iter()).collect();
        self.map.connections().iter().filter(|c| !owned.contains(c)).cloned().collect()
    }

    pub fn can_active_participant_acquire(&self, connection: &Connection) -> bool {
        let pgs = &self.participants[self.turn];
        let has_rails = pgs.rails >= connection.length;
        let has_cards = pgs.cards.get(&connection.color).copied().unwrap_or(0) >= connection.length;
        has_rails && has_cards && self.free_connections().contains(connection)
    }

    /// All free connections that `state` could legally acquire right now,
    /// regardless of whose turn it actually is.
    pub fn acquirable_by(&self, state: &ParticipantGameState) -> HashSet<Connection> {
        self.free_connections()
            .into_iter()
            .filter(|c| {
                state.rails >= c.length && state.cards.get(&c.color).copied().unwrap_or(0) >= c.length
            })
            .collect()
    }

    pub fn draw_for_active(&mut self, count: usize) -> Vec<crate::color::Color> {
        let drawn = self.deck.draw(count);
        self.participants[self.turn].add_cards(&drawn);
        drawn
    }

    pub fn acquire_for_active(&mut self, connection: Connection) {
        let pgs = &mut self.participants[self.turn];
        *pgs.cards.get_mut(&connection.color).expect("every color is tracked") -= connection.length;
        pgs.rails -= connection.length;
        pgs.owned.insert(connection);
    }

    pub fn next_turn(&mut self) {
        self.turn = (self.turn + 1) % self.participants.len();
    }

    /// Whether any participant has dropped below the rail threshold that
    /// starts the game's final round.
    pub fn is_last_turn(&self) -> bool {
        self.participants.iter().any(|p| p.rails < MIN_RAILS_TO_NOT_TRIGGER_LAST_TURN)
    }

    /// Builds the view a participant sees of the game when it becomes their
    /// turn: their own state, plus every opponent's acquired connections,
    /// rotated so index 0 is the opponent who plays immediately after them.
    pub fn project(&self, participant_index: usize) -> ParticipantView {
        let pgs = &self.participants[participant_index];
        let n = self.participants.len();
        let others: Vec<HashSet<Connection>> = (0..n)
            .filter(|&i| i != participant_index)
            .map(|i| self.participants[i].owned.clone())
            .collect();
        let rotate = if others.is_empty() { 0 } else { participant_index % others.len() };
        let opponents = others[rotate..].iter().chain(others[..rotate].iter()).cloned().collect();

        ParticipantView {
            owned: pgs.owned.clone(),
            cards: pgs.cards.clone(),
            rails: pgs.rails,
            destinations: pgs.destinations.clone(),
            opponents,
        }
    }
}

/// Runs one game of Trains: sets participants up, drives the turn loop,
/// isolates cheaters and crashers, and scores the result.
///
/// Construct with [`Referee::new`], then call [`Referee::play_game`] exactly
/// once; no other method should be called afterward.
pub struct Referee<'a> {
    participants: &'a mut [Box<dyn Participant>],
    state: RefereeState,
    banned: HashSet<usize>,
    took_last_turn: HashSet<usize>,
    stall_count: usize,
}

impl<'a> Referee<'a> {
    /// Builds a referee with uniformly random destination-option sampling —
    /// the default used by ordinary play.
    pub fn new(
        map: Map,
        participants: &'a mut [Box<dyn Participant>],
        deck: Option<Deck>,
    ) -> Result<Self, SetupError> {
        Self::new_with_sampling(map, participants, deck, DestinationSampling::Random)
    }

    /// Builds a referee whose destination-option sampling is deterministic:
    /// each participant is offered the lexicographically smallest
    /// still-available destinations rather than a random subset. Two runs
    /// built this way with the same map, deck, and participant strategies
    /// produce identical rankings — the reproducibility hook described for
    /// deterministic tournament tests.
    pub fn new_deterministic(
        map: Map,
        participants: &'a mut [Box<dyn Participant>],
        deck: Option<Deck>,
    ) -> Result<Self, SetupError> {
        Self::new_with_sampling(map, participants, deck, DestinationSampling::LexicographicallySmallest)
    }

    fn new_with_sampling(
        map: Map,
        participants: &'a mut [Box<dyn Participant>],
        deck: Option<Deck>,
        sampling: DestinationSampling,
    ) -> Result<Self, SetupError> {
        let count = participants.len();
        if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&count) {
            return Err(SetupError::WrongParticipantCount { min: MIN_PARTICIPANTS, max: MAX_PARTICIPANTS, got: count });
        }
        if !map.has_enough_destinations(count, NUM_DESTINATION_OPTIONS, NUM_DESTINATIONS) {
            return Err(SetupError::InsufficientDestinations);
        }

        let mut deck = deck.unwrap_or_else(|| Deck::random(INITIAL_DECK_SIZE));
        let mut banned = HashSet::new();
        let mut feasible: HashSet<Destination> = map.all_feasible_destinations();

        let mut states = Vec::with_capacity(count);
        for (index, participant) in participants.iter_mut().enumerate() {
            let hand = deck.draw(INITIAL_HAND_SIZE);
            let mut pgs = ParticipantGameState::new(INITIAL_RAIL_COUNT, HashSet::new());
            pgs.add_cards(&hand);

            let setup_ok = guarded_call(|| participant.setup(&map, INITIAL_RAIL_COUNT, &pgs.cards)).is_ok();
            if !setup_ok {
                log::warn!("participant {index} banned: threw during setup");
                banned.insert(index);
            } else {
                let options = sampling.sample(&feasible, NUM_DESTINATION_OPTIONS);
                let chosen = match guarded_call(|| participant.pick(&options)) {
                    Ok(not_chosen) => options.difference(&not_chosen).cloned().collect::<HashSet<_>>(),
                    Err(_) => options.clone(),
                };
                if chosen.len() == NUM_DESTINATIONS && chosen.is_subset(&options) {
                    feasible = feasible.difference(&chosen).cloned().collect();
                    pgs.destinations = chosen;
                } else {
                    log::warn!("participant {index} banned: invalid destination selection");
                    banned.insert(index);
                }
            }
            states.push(pgs);
        }

        let state = RefereeState { map, deck, participants: states, turn: 0 };
        Ok(Self { participants, state, banned, took_last_turn: HashSet::new(), stall_count: 0 })
    }

    fn active_remaining(&self) -> usize {
        self.participants.len() - self.banned.len()
    }

    fn is_game_over(&self) -> bool {
        self.active_remaining() == 0
            || self.stall_count == self.active_remaining()
            || self.took_last_turn.len() == self.active_remaining()
    }

    fn boot(&mut self, index: usize) {
        log::warn!("participant {index} booted");
        self.state.participants[index] = ParticipantGameState::new(MIN_RAILS_TO_NOT_TRIGGER_LAST_TURN, HashSet::new());
        self.banned.insert(index);
    }

    /// A participant booted mid-turn is excluded from the stall count for
    /// that turn entirely: the counter is neither incremented nor reset, as
    /// if the turn hadn't happened for progress-tracking purposes. Only a
    /// turn that actually completes (successfully or not) updates it.
    fn execute_active_turn(&mut self) {
        let active_index = self.state.turn;
        let view = self.state.project(active_index);

        let participants = &mut self.participants;
        let move_result =
            guarded_call(|| participants[active_index].play(&view));

        match move_result {
            Err(_) => {
                self.boot(active_index);
            }
            Ok(mv) => {
                let state = &mut self.state;
                let active = self.participants[active_index].as_mut();
                let mut visitor = ApplyVisitor { state, active };
                let apply_result = guarded_call(|| mv.accept(&mut visitor));
                match apply_result {
                    Ok(Ok(changed)) => {
                        self.stall_count = if changed { 0 } else { self.stall_count + 1 };
                    }
                    Ok(Err(_)) | Err(_) => {
                        self.boot(active_index);
                    }
                }
            }
        }
    }

    fn update_participant_states(&mut self) {
        // Nothing cached needs refreshing; `project` is computed on demand.
        // Kept as a named step to mirror the turn loop's shape one-for-one.
    }

    fn main_loop(&mut self) {
        while !self.is_game_over() {
            let active_index = self.state.turn;
            if self.banned.contains(&active_index) {
                self.state.next_turn();
                continue;
            }

            self.execute_active_turn();
            self.update_participant_states();

            if self.state.is_last_turn() {
                self.took_last_turn.insert(active_index);
            }
            self.state.next_turn();
        }
    }

    fn longest_path_from(&self, participant_index: usize) -> u32 {
        let connections: Vec<&Connection> = self.state.participants[participant_index].owned.iter().collect();
        if connections.is_empty() {
            return 0;
        }

        let mut adjacency: HashMap<&crate::city::City, Vec<usize>> = HashMap::new();
        for (edge_index, connection) in connections.iter().enumerate() {
            let (a, b) = connection.cities();
            adjacency.entry(a).or_default().push(edge_index);
            adjacency.entry(b).or_default().push(edge_index);
        }

        let mut max_weight = 0u32;
        for &start in adjacency.keys() {
            let mut visited = HashSet::new();
            visited.insert(start);
            dfs_longest_path(start, &connections, &adjacency, &mut visited, 0, &mut max_weight);
        }
        max_weight
    }

    fn participants_with_longest_path(&self) -> Vec<usize> {
        let mut best: Vec<usize> = Vec::new();
        let mut best_length = None;
        for index in 0..self.participants.len() {
            if self.banned.contains(&index) {
                continue;
            }
            let length = self.longest_path_from(index);
            match best_length {
                Some(current_best) if length < current_best => {}
                Some(current_best) if length == current_best => best.push(index),
                _ => {
                    best = vec![index];
                    best_length = Some(length);
                }
            }
        }
        best
    }

    fn score_game(&self) -> HashMap<usize, i64> {
        let mut scores = HashMap::new();
        for index in 0..self.participants.len() {
            if self.banned.contains(&index) {
                continue;
            }
            let pgs = &self.state.participants[index];
            let connection_score: i64 = pgs.owned.iter().map(|c| c.length as i64 * RAIL_SEGMENT_POINTS).sum();
            let reached = self.state.map.feasible_destinations(&pgs.owned);
            let destination_score: i64 = pgs
                .destinations
                .iter()
                .map(|d| if reached.contains(d) { DESTINATION_POINTS } else { -DESTINATION_POINTS })
                .sum();
            scores.insert(index, connection_score + destination_score);
        }

        for index in self.participants_with_longest_path() {
            *scores.entry(index).or_insert(0) += LONGEST_PATH_POINTS;
        }

        scores
    }

    fn rank_participants(&self, scores: &HashMap<usize, i64>) -> Vec<Vec<usize>> {
        let mut by_score: HashMap<i64, Vec<usize>> = HashMap::new();
        for (&index, &score) in scores {
            by_score.entry(score).or_default().push(index);
        }

        let mut scores_desc: Vec<i64> = by_score.keys().copied().collect();
        scores_desc.sort_unstable_by(|a, b| b.cmp(a));

        scores_desc
            .into_iter()
            .map(|score| {
                let mut group = by_score.remove(&score).unwrap();
                group.sort_by_key(|&index| self.participants[index].name());
                group
            })
            .collect()
    }

    fn notify_participants(&mut self, winners: &[usize]) {
        for index in 0..self.participants.len() {
            if self.banned.contains(&index) {
                continue;
            }
            let won = winners.contains(&index);
            let _ = guarded_call(|| self.participants[index].win(won));
        }
    }

    /// Runs setup-through-completion of a game: the main turn loop, then
    /// scoring, ranking, and win/loss notification.
    ///
    /// Returns the ranking (highest to lowest place, ties grouped together
    /// and sorted by name) and the indices of booted/banned participants.
    pub fn play_game(mut self) -> (Vec<Vec<usize>>, Vec<usize>) {
        self.main_loop();

        let scores = self.score_game();
        let rankings = self.rank_participants(&scores);
        let winners = rankings.first().cloned().unwrap_or_default();
        self.notify_participants(&winners);

        let mut banned: Vec<usize> = self.banned.into_iter().collect();
        banned.sort_by_key(|&index| self.participants[index].name());
        (rankings, banned)
    }
}

fn dfs_longest_path<'c>(
    city: &'c crate::city::City,
    connections: &[&'c Connection],
    adjacency: &HashMap<&'c crate::city::City, Vec<usize>>,
    visited: &mut HashSet<&'c crate::city::City>,
    weight: u32,
    max_weight: &mut u32,
) {
    *max_weight = (*max_weight).max(weight);
    let Some(edges) = adjacency.get(city) else { return };
    for &edge_index in edges {
        let connection = connections[edge_index];
        let Some(neighbor) = connection.other_end(city) else { continue };
        if visited.contains(neighbor) {
            continue;
        }
        visited.insert(neighbor);
        dfs_longest_path(neighbor, connections, adjacency, visited, weight + connection.length, max_weight);
        visited.remove(neighbor);
    }
}

/// How a referee samples the destination options offered to each
/// participant at setup. Random sampling is ordinary play; the
/// lexicographic variant trades realism for reproducibility in tests.
enum DestinationSampling {
    Random,
    LexicographicallySmallest,
}

impl DestinationSampling {
    fn sample(&self, pool: &HashSet<Destination>, count: usize) -> HashSet<Destination> {
        match self {
            DestinationSampling::Random => {
                let mut items: Vec<&Destination> = pool.iter().collect();
                items.shuffle(&mut thread_rng());
                items.into_iter().take(count).cloned().collect()
            }
            DestinationSampling::LexicographicallySmallest => {
                let mut items: Vec<&Destination> = pool.iter().collect();
                items.sort();
                items.into_iter().take(count).cloned().collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::City;
    use crate::color::Color;
    use crate::connection::Connection;
    use std::collections::HashMap as Map2;

    struct AlwaysDraw {
        drawn: usize,
    }

    impl Participant for AlwaysDraw {
        fn name(&self) -> String {
            "always-draw".to_string()
        }
        fn setup(&mut self, _map: &Map, _rails: u32, _cards: &Map2<Color, u32>) {}
        fn pick(&mut self, options: &HashSet<Destination>) -> HashSet<Destination> {
            options.iter().take(options.len().saturating_sub(NUM_DESTINATIONS)).cloned().collect()
        }
        fn play(&mut self, _view: &ParticipantView) -> Move {
            Move::DrawCards
        }
        fn more(&mut self, cards: &[Color]) {
            self.drawn += cards.len();
        }
        fn win(&mut self, _won: bool) {}
        fn start(&mut self) -> Map {
            crate::map::default_map()
        }
        fn end(&mut self, _won: bool) {}
    }

    fn two_always_draw() -> Vec<Box<dyn Participant>> {
        vec![Box::new(AlwaysDraw { drawn: 0 }), Box::new(AlwaysDraw { drawn: 0 })]
    }

    #[test]
    fn setup_rejects_too_few_participants() {
        let map = crate::map::default_map();
        let mut one = vec![Box::new(AlwaysDraw { drawn: 0 }) as Box<dyn Participant>];
        assert!(Referee::new(map, &mut one, None).is_err());
    }

    #[test]
    fn game_with_only_draws_ends_via_stall() {
        let map = crate::map::default_map();
        let mut participants = two_always_draw();
        let referee = Referee::new(map, &mut participants, Some(Deck::random(250))).unwrap();
        let (rankings, banned) = referee.play_game();
        assert!(banned.is_empty());
        assert!(!rankings.is_empty());
    }

    #[test]
    fn deterministic_sampling_is_reproducible_across_runs() {
        fn run() -> (Vec<Vec<usize>>, Vec<usize>) {
            let map = crate::map::default_map();
            let mut participants = two_always_draw();
            let referee =
                Referee::new_deterministic(map, &mut participants, Some(Deck::from_colors(vec![Color::Red; 250])))
                    .unwrap();
            referee.play_game()
        }
        assert_eq!(run(), run());
    }

    #[test]
    fn acquirable_by_is_restricted_to_an_arbitrary_states_rails_and_cards() {
        use crate::participant_state::ParticipantGameState;

        let map = crate::map::default_map();
        let all_connections = map.connections().clone();
        let state = RefereeState {
            map,
            deck: Deck::random(10),
            participants: vec![
                ParticipantGameState::new(INITIAL_RAIL_COUNT, HashSet::new()),
                ParticipantGameState::new(INITIAL_RAIL_COUNT, HashSet::new()),
            ],
            turn: 0,
        };

        let poor = ParticipantGameState::new(INITIAL_RAIL_COUNT, HashSet::new());
        assert!(state.acquirable_by(&poor).is_empty());

        let mut rich = ParticipantGameState::new(INITIAL_RAIL_COUNT, HashSet::new());
        for color in Color::ALL {
            rich.cards.insert(color, INITIAL_RAIL_COUNT);
        }
        assert_eq!(state.acquirable_by(&rich), all_connections);
    }

    #[test]
    fn current_turn_reflects_the_turn_field() {
        let map = crate::map::default_map();
        let mut participants = two_always_draw();
        let referee = Referee::new(map, &mut participants, Some(Deck::random(250))).unwrap();
        assert_eq!(referee.state.current_turn(), referee.state.turn);
    }

    #[test]
    fn longest_path_is_zero_with_no_connections() {
        let map = crate::map::default_map();
        let mut participants = two_always_draw();
        let referee = Referee::new(map, &mut participants, Some(Deck::random(250))).unwrap();
        assert_eq!(referee.longest_path_from(0), 0);
    }

    #[test]
    fn dfs_sums_edge_lengths_along_a_simple_path() {
        let a = City::new("A", 0, 0);
        let b = City::new("B", 0, 0);
        let c = City::new("C", 0, 0);
        let ab = Connection::new(a.clone(), b.clone(), Color::Blue, 3).unwrap();
        let bc = Connection::new(b.clone(), c.clone(), Color::Red, 4).unwrap();
        let connections = vec![&ab, &bc];
        let mut adjacency: HashMap<&City, Vec<usize>> = HashMap::new();
        adjacency.insert(&a, vec![0]);
        adjacency.insert(&b, vec![0, 1]);
        adjacency.insert(&c, vec![1]);

        let mut max_weight = 0;
        let mut visited = HashSet::new();
        visited.insert(&a);
        dfs_longest_path(&a, &connections, &adjacency, &mut visited, 0, &mut max_weight);
        assert_eq!(max_weight, 7);
    }
}
