use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::trace;

use crate::util::PseudoRandom;
use crate::{Arena, Direction, Position, Snake, SnakeId};

/// Decide the next heading for `snake_id`, or `None` to keep the current
/// one. Decisions are tried in strict priority order: a safe path to the
/// food, a path to the snake's own tail, any free adjacent cell, and
/// finally the unchanged heading when the snake is fully boxed in.
pub fn decide(arena: &Arena, snake_id: SnakeId, rng: &mut PseudoRandom) -> Option<Direction> {
    let snake = arena.snake(snake_id)?;
    if !snake.is_alive {
        return None;
    }
    let opponent = arena.opponent_of(snake_id)?;
    let head = snake.head();
    let blocked = obstacle_map(arena, snake, opponent);

    // Safe path to the food. Long snakes occasionally pass it up so
    // matches don't settle into a deterministic chase.
    if let Some(food) = arena.food() {
        if let Some(path) = find_path(head, food, &blocked) {
            if is_path_safe(arena, snake, opponent, &path) {
                let deterred = snake.len() >= arena.config().food_deterrent_length
                    && rng.chance(arena.config().food_deterrent_chance);
                if !deterred {
                    if let Some(dir) = first_step(&path) {
                        return Some(dir);
                    }
                } else {
                    trace!(snake_id, "passing up food path");
                }
            }
        }
    }

    // Chasing the tail is always eventually survivable: the tail cell
    // frees up on the next move.
    if let Some(path) = find_path(head, snake.tail(), &blocked) {
        if let Some(dir) = first_step(&path) {
            return Some(dir);
        }
    }

    // Any free neighbor, keeping as far from the opponent's head as
    // possible. Ties fall to the first direction in enumeration order.
    let opponent_head = opponent.head();
    let mut best: Option<(u16, Direction)> = None;
    for dir in Direction::ALL {
        let next = head.step(dir);
        if blocked.contains(&next) {
            continue;
        }
        let dist = next.manhattan_distance(opponent_head);
        if best.map_or(true, |(best_dist, _)| dist > best_dist) {
            best = Some((dist, dir));
        }
    }
    if let Some((_, dir)) = best {
        return Some(dir);
    }

    // Boxed in. Keep heading; the collision check settles it next tick.
    trace!(snake_id, "no free neighbor, keeping heading");
    Some(snake.direction)
}

/// Cells `snake` must not path through: the ring just outside the board,
/// its own body except the vacating tail, the opponent's entire body, and
/// all obstacles. Food and power-ups never block.
pub fn obstacle_map(arena: &Arena, snake: &Snake, opponent: &Snake) -> HashSet<Position> {
    let mut blocked = HashSet::new();
    let n = arena.grid().tile_count;

    for i in -1..=n {
        blocked.insert(Position::new(i, -1));
        blocked.insert(Position::new(i, n));
        blocked.insert(Position::new(-1, i));
        blocked.insert(Position::new(n, i));
    }

    let body_len = snake.len();
    blocked.extend(snake.body.iter().take(body_len.saturating_sub(1)).copied());
    blocked.extend(opponent.body.iter().copied());
    blocked.extend(arena.obstacles().iter().copied());

    blocked
}

/// The next step of a path is unsafe if taking it would leave the snake
/// with no escape route (checked against a stricter map that blocks the
/// snake's whole body, tail included), or if it contests a cell the
/// opponent's head can also reach next tick while the opponent is at
/// least as long and the detour isn't short.
fn is_path_safe(arena: &Arena, snake: &Snake, opponent: &Snake, path: &[Position]) -> bool {
    let Some(&destination) = path.get(1) else {
        return false;
    };

    let opponent_head = opponent.head();
    let contested = Direction::ALL
        .into_iter()
        .any(|dir| opponent_head.step(dir) == destination);
    if contested && opponent.len() >= snake.len() && path.len() > 3 {
        return false;
    }

    let mut strict = obstacle_map(arena, snake, opponent);
    strict.extend(snake.body.iter().copied());
    Direction::ALL
        .into_iter()
        .any(|dir| !strict.contains(&destination.step(dir)))
}

fn first_step(path: &[Position]) -> Option<Direction> {
    Direction::between(*path.first()?, *path.get(1)?)
}

/// Open-set entry. `Ord` is reversed on the f-score so `BinaryHeap` pops
/// the lowest, with the insertion sequence breaking ties FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f_score: u32,
    seq: u32,
    position: Position,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over the four-connected grid with unit edge cost and Manhattan
/// heuristic. Returns the full cell sequence from `start` to `goal`
/// inclusive, or `None` when the open set drains without reaching the
/// goal. Absence of a path is a normal outcome, not an error.
pub fn find_path(
    start: Position,
    goal: Position,
    blocked: &HashSet<Position>,
) -> Option<Vec<Position>> {
    let mut open = BinaryHeap::new();
    let mut closed: HashSet<Position> = HashSet::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, u32> = HashMap::new();
    let mut seq = 0u32;

    g_score.insert(start, 0);
    open.push(OpenNode {
        f_score: start.manhattan_distance(goal) as u32,
        seq,
        position: start,
    });

    while let Some(node) = open.pop() {
        let current = node.position;
        if current == goal {
            return Some(reconstruct_path(&came_from, current));
        }
        if !closed.insert(current) {
            // Stale heap entry for an already expanded cell.
            continue;
        }

        let current_g = g_score[&current];
        for dir in Direction::ALL {
            let neighbor = current.step(dir);
            if blocked.contains(&neighbor) || closed.contains(&neighbor) {
                continue;
            }
            let tentative = current_g + 1;
            if g_score.get(&neighbor).is_none_or(|&g| tentative < g) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                seq += 1;
                open.push(OpenNode {
                    f_score: tentative + neighbor.manhattan_distance(goal) as u32,
                    seq,
                    position: neighbor,
                });
            }
        }
    }

    None
}

fn reconstruct_path(came_from: &HashMap<Position, Position>, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ArenaConfig, MatchMode};

    fn empty_blocked() -> HashSet<Position> {
        HashSet::new()
    }

    #[test]
    fn straight_line_path_is_optimal() {
        let path = find_path(
            Position::new(0, 0),
            Position::new(5, 0),
            &empty_blocked(),
        )
        .unwrap();
        // Cell count equals Manhattan distance + 1 on an open grid.
        assert_eq!(path.len(), 6);
        assert_eq!(path[0], Position::new(0, 0));
        assert_eq!(path[5], Position::new(5, 0));
    }

    #[test]
    fn diagonal_path_is_optimal() {
        let path = find_path(
            Position::new(2, 2),
            Position::new(6, 5),
            &empty_blocked(),
        )
        .unwrap();
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn full_wall_yields_no_path() {
        // Board ring plus a vertical wall at x=3 separating start and goal.
        let n = 8i16;
        let mut blocked = HashSet::new();
        for i in -1..=n {
            blocked.insert(Position::new(i, -1));
            blocked.insert(Position::new(i, n));
            blocked.insert(Position::new(-1, i));
            blocked.insert(Position::new(n, i));
        }
        for y in 0..n {
            blocked.insert(Position::new(3, y));
        }
        assert_eq!(
            find_path(Position::new(1, 4), Position::new(6, 4), &blocked),
            None
        );
    }

    #[test]
    fn path_routes_around_partial_wall() {
        let mut blocked = HashSet::new();
        for y in 0..5 {
            blocked.insert(Position::new(3, y));
        }
        let path = find_path(Position::new(1, 2), Position::new(6, 2), &blocked).unwrap();
        assert_eq!(path[0], Position::new(1, 2));
        assert_eq!(*path.last().unwrap(), Position::new(6, 2));
        assert!(path.iter().all(|p| !blocked.contains(p)));
        // Detour must be longer than the straight-line distance.
        assert!(path.len() > 6);
    }

    fn fixture_arena() -> Arena {
        let mut arena = Arena::new(ArenaConfig::default(), 12345);
        arena.start_match(MatchMode::AiVsAi);
        arena
    }

    #[test]
    fn seeks_food_straight_ahead() {
        let mut arena = fixture_arena();
        arena.food = Some(Position::new(10, 5));
        // Snake 1 spawns at (5,5) facing right; the food is 5 cells ahead.
        let mut rng = PseudoRandom::new(9);
        for _ in 0..5 {
            let dir = decide(&arena, 1, &mut rng);
            assert_eq!(dir, Some(Direction::Right));
            let snake = arena.snakes.iter_mut().find(|s| s.id == 1).unwrap();
            snake.advance(dir);
        }
        assert_eq!(
            arena.snake(1).unwrap().head(),
            Position::new(10, 5)
        );
    }

    #[test]
    fn trapped_snake_keeps_its_heading() {
        let mut arena = fixture_arena();
        // Box snake 1's head in with obstacles on every free side. The
        // cell behind the head is its own neck already.
        let head = arena.snake(1).unwrap().head();
        arena.obstacles.insert(head.step(Direction::Up));
        arena.obstacles.insert(head.step(Direction::Down));
        arena.obstacles.insert(head.step(Direction::Right));
        let current = arena.snake(1).unwrap().direction;
        let mut rng = PseudoRandom::new(9);
        assert_eq!(decide(&arena, 1, &mut rng), Some(current));
    }

    #[test]
    fn tail_chase_when_food_is_unreachable() {
        let mut arena = fixture_arena();
        // Wall the food off completely so tier 1 fails.
        let food = Position::new(20, 20);
        arena.food = Some(food);
        for dir in Direction::ALL {
            arena.obstacles.insert(food.step(dir));
        }
        let mut rng = PseudoRandom::new(9);
        let dir = decide(&arena, 1, &mut rng).unwrap();
        // The first step of the tail path must be a free cell.
        let snake = arena.snake(1).unwrap();
        let opponent = arena.opponent_of(1).unwrap();
        let blocked = obstacle_map(&arena, snake, opponent);
        assert!(!blocked.contains(&snake.head().step(dir)));
    }

    #[test]
    fn retreats_from_opponent_when_cornered() {
        let mut arena = fixture_arena();
        // Surround the food so tier 1 fails, and cut the snake off from
        // its tail so tier 2 fails too: head in a corridor.
        let food = Position::new(20, 20);
        arena.food = Some(food);
        for dir in Direction::ALL {
            arena.obstacles.insert(food.step(dir));
        }
        // Rebuild snake 1 as an L-shape whose tail is sealed away.
        {
            let snake = arena.snakes.iter_mut().find(|s| s.id == 1).unwrap();
            snake.body = [(2, 2), (2, 3), (2, 4)]
                .into_iter()
                .map(|(x, y)| Position::new(x, y))
                .collect();
            snake.direction = Direction::Up;
        }
        for pos in [(1, 4), (3, 4), (2, 5), (1, 3), (3, 3)] {
            arena.obstacles.insert(Position::new(pos.0, pos.1));
        }
        let mut rng = PseudoRandom::new(9);
        let dir = decide(&arena, 1, &mut rng).unwrap();
        // Free neighbors of (2,2) are (2,1), (1,2), (3,2); the opponent
        // sits in the far corner, so the farthest-away pick must not step
        // toward it.
        let head = arena.snake(1).unwrap().head();
        let next = head.step(dir);
        let opp_head = arena.opponent_of(1).unwrap().head();
        for candidate in [Direction::Up, Direction::Left] {
            let alt = head.step(candidate);
            assert!(
                next.manhattan_distance(opp_head) >= alt.manhattan_distance(opp_head)
            );
        }
    }

    #[test]
    fn contested_destination_fails_safety_check() {
        let arena = fixture_arena();
        let snake = arena.snake(1).unwrap();
        let opponent = arena.opponent_of(1).unwrap();
        let head = snake.head();
        // A long path whose next step lands beside the opponent's head.
        let destination = opponent.head().step(Direction::Up);
        let path = vec![head, destination, Position::new(0, 0), Position::new(1, 0)];
        assert!(!is_path_safe(&arena, snake, opponent, &path));
    }
}
