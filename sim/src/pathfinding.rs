//! Tile-grid A* pathfinding.
//!
//! Eight-directional search weighted by terrain cost. Impassable terrain and
//! building tiles are never entered; occupied tiles are avoided when an
//! occupancy grid is supplied. Every call is a self-contained search with no
//! shared state, so requests can run back to back or in parallel.
//!
//! When the requested goal tile is blocked the search settles for the
//! nearest reachable tile next to it, unless the request is strict.

use crate::geometry::TileCoord;
use crate::mines::MineLookup;
use crate::occupancy::OccupancyGrid;
use crate::terrain::{MapGrid, MIN_TILE_COST};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// 8-directional moves: (dx, dy, cost multiplier)
const DIRS: [(i32, i32, f32); 8] = [
    (1, 0, 1.0),
    (-1, 0, 1.0),
    (0, 1, 1.0),
    (0, -1, 1.0),
    (1, 1, std::f32::consts::SQRT_2),
    (-1, 1, std::f32::consts::SQRT_2),
    (1, -1, std::f32::consts::SQRT_2),
    (-1, -1, std::f32::consts::SQRT_2),
];

/// Knobs for a single path request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// Fail instead of substituting a tile when the exact goal is unreachable.
    pub strict_destination: bool,
    /// Skip every mine check.
    pub ignore_friendly_mines: bool,
    /// Node-expansion budget. `None` allows one expansion per map tile, which
    /// is enough for any reachable goal.
    pub max_nodes: Option<usize>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            strict_destination: false,
            ignore_friendly_mines: false,
            max_nodes: None,
        }
    }
}

impl PathOptions {
    pub fn strict() -> Self {
        Self {
            strict_destination: true,
            ..Self::default()
        }
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }
}

/// Find a path from `start` to `end`.
///
/// The result starts with `start` and ends at the resolved goal. It is empty
/// when the map is missing or empty, when either endpoint is off the map, or
/// when a strict request cannot reach `end` exactly. `start == end` yields
/// `[start]`.
pub fn find_path(
    start: TileCoord,
    end: TileCoord,
    map: Option<&MapGrid>,
    occupancy: Option<&OccupancyGrid>,
    options: &PathOptions,
) -> Vec<TileCoord> {
    let Some(map) = map else {
        return Vec::new();
    };
    let grid = SearchGrid { map, occupancy, mines: None };
    search(&grid, start, end, options)
}

/// Find a path on behalf of `owner`.
///
/// Mines laid by other owners block their tiles; the owner's own mines do
/// not. `ignore_friendly_mines` turns mine checks off altogether.
pub fn find_path_for_owner(
    start: TileCoord,
    end: TileCoord,
    map: Option<&MapGrid>,
    occupancy: Option<&OccupancyGrid>,
    owner: u8,
    mines: &dyn MineLookup,
    options: &PathOptions,
) -> Vec<TileCoord> {
    let Some(map) = map else {
        return Vec::new();
    };
    let mines = if options.ignore_friendly_mines {
        None
    } else {
        Some(MineFilter { owner, mines })
    };
    let grid = SearchGrid { map, occupancy, mines };
    search(&grid, start, end, options)
}

struct MineFilter<'a> {
    owner: u8,
    mines: &'a dyn MineLookup,
}

/// Read-only view of everything that decides whether a tile can be entered.
struct SearchGrid<'a> {
    map: &'a MapGrid,
    occupancy: Option<&'a OccupancyGrid>,
    mines: Option<MineFilter<'a>>,
}

impl SearchGrid<'_> {
    /// Terrain and buildings only.
    fn terrain_walkable(&self, tile: TileCoord) -> bool {
        self.map.get(tile).is_some_and(|t| t.is_walkable())
    }

    fn is_walkable(&self, tile: TileCoord) -> bool {
        if !self.terrain_walkable(tile) {
            return false;
        }
        if let Some(occupancy) = self.occupancy {
            if !occupancy.is_free(tile) {
                return false;
            }
        }
        if let Some(filter) = &self.mines {
            if filter.mines.mine_owner_at(tile).is_some()
                && !filter.mines.is_friendly_mine(tile, filter.owner)
            {
                return false;
            }
        }
        true
    }

    fn step_cost(&self, tile: TileCoord) -> f32 {
        self.map
            .get(tile)
            .map(|t| t.tile_type.base_cost())
            .unwrap_or(f32::INFINITY)
    }

    #[inline]
    fn index(&self, tile: TileCoord) -> usize {
        tile.y as usize * self.map.width + tile.x as usize
    }

    #[inline]
    fn tile_at(&self, index: usize) -> TileCoord {
        TileCoord::new((index % self.map.width) as i32, (index / self.map.width) as i32)
    }
}

/// Open-set entry ordered so `BinaryHeap` pops the lowest `f` first.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenNode {
    f: f32,
    g: f32,
    index: usize,
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            // Prefer the node further along when f ties.
            .then_with(|| self.g.total_cmp(&other.g))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn search(grid: &SearchGrid<'_>, start: TileCoord, end: TileCoord, options: &PathOptions) -> Vec<TileCoord> {
    let map = grid.map;
    if map.is_empty() || map.tiles.len() != map.width * map.height {
        return Vec::new();
    }
    if !map.in_bounds(start) || !map.in_bounds(end) {
        return Vec::new();
    }
    // Only the start tile's occupancy is skipped; the unit may stand there.
    if !grid.terrain_walkable(start) {
        return Vec::new();
    }
    if start == end {
        return vec![start];
    }

    let goal_blocked = !grid.is_walkable(end);
    if goal_blocked && options.strict_destination {
        return Vec::new();
    }
    let accepts = |tile: TileCoord| {
        if goal_blocked {
            tile.chebyshev(end) == 1
        } else {
            tile == end
        }
    };
    let heuristic = |tile: TileCoord| tile.octile(end) * MIN_TILE_COST;

    let n = map.width * map.height;
    let max_nodes = options.max_nodes.unwrap_or(n);
    let mut g_score = vec![f32::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();

    let start_idx = grid.index(start);
    g_score[start_idx] = 0.0;
    open.push(OpenNode { f: heuristic(start), g: 0.0, index: start_idx });

    // Closest explored tile to the goal, used when the search gives up.
    let mut best = (heuristic(start), start_idx);
    let mut expanded = 0usize;

    while let Some(OpenNode { g, index, .. }) = open.pop() {
        if closed[index] {
            continue;
        }
        closed[index] = true;

        let tile = grid.tile_at(index);
        if accepts(tile) {
            return reconstruct(grid, &came_from, index);
        }

        expanded += 1;
        if expanded > max_nodes {
            break;
        }

        let h = heuristic(tile);
        if h < best.0 {
            best = (h, index);
        }

        for &(dx, dy, multiplier) in &DIRS {
            let next = TileCoord::new(tile.x + dx, tile.y + dy);
            if !map.in_bounds(next) {
                continue;
            }
            let next_idx = grid.index(next);
            if closed[next_idx] || !grid.is_walkable(next) {
                continue;
            }
            // No squeezing diagonally past impassable terrain or buildings.
            if dx != 0
                && dy != 0
                && !(grid.terrain_walkable(TileCoord::new(tile.x + dx, tile.y))
                    && grid.terrain_walkable(TileCoord::new(tile.x, tile.y + dy)))
            {
                continue;
            }

            let tentative = g + grid.step_cost(next) * multiplier;
            if tentative < g_score[next_idx] {
                g_score[next_idx] = tentative;
                came_from[next_idx] = index;
                open.push(OpenNode {
                    f: tentative + heuristic(next),
                    g: tentative,
                    index: next_idx,
                });
            }
        }
    }

    if options.strict_destination {
        return Vec::new();
    }
    reconstruct(grid, &came_from, best.1)
}

fn reconstruct(grid: &SearchGrid<'_>, came_from: &[usize], goal: usize) -> Vec<TileCoord> {
    let mut path = Vec::new();
    let mut current = goal;
    loop {
        path.push(grid.tile_at(current));
        let prev = came_from[current];
        if prev == usize::MAX {
            break;
        }
        current = prev;
    }
    path.reverse();
    path
}
