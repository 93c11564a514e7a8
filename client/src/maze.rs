use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    fn offset(self) -> (isize, isize) {
        match self {
            Side::Top => (-1, 0),
            Side::Right => (0, 1),
            Side::Bottom => (1, 0),
            Side::Left => (0, -1),
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Grid of cells; each cell keeps a bitmask of its standing walls.
/// Row 0 is the top (-Z) edge, column 0 the left (-X) edge.
pub struct Maze {
    pub rows: usize,
    pub cols: usize,
    walls: Vec<u8>,
}

impl Maze {
    fn closed(rows: usize, cols: usize) -> Self {
        let all = Side::ALL.iter().fold(0, |acc, side| acc | side.bit());
        Self {
            rows,
            cols,
            walls: vec![all; rows * cols],
        }
    }

    pub fn has_wall(&self, row: usize, col: usize, side: Side) -> bool {
        self.walls[row * self.cols + col] & side.bit() != 0
    }

    fn remove_wall(&mut self, row: usize, col: usize, side: Side) {
        self.walls[row * self.cols + col] &= !side.bit();
    }

    fn neighbor(&self, row: usize, col: usize, side: Side) -> Option<(usize, usize)> {
        let (dr, dc) = side.offset();
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < self.rows && c < self.cols).then_some((r, c))
    }

    /// Number of open passages between adjacent cells.
    #[cfg(test)]
    pub fn passage_count(&self) -> usize {
        let mut count = 0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                if row + 1 < self.rows && !self.has_wall(row, col, Side::Bottom) {
                    count += 1;
                }
                if col + 1 < self.cols && !self.has_wall(row, col, Side::Right) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Cells reachable from (0, 0) through open passages.
    #[cfg(test)]
    pub fn reachable_count(&self) -> usize {
        if self.rows == 0 || self.cols == 0 {
            return 0;
        }
        let mut seen = vec![false; self.rows * self.cols];
        let mut stack = vec![(0, 0)];
        seen[0] = true;
        let mut count = 0;
        while let Some((row, col)) = stack.pop() {
            count += 1;
            for side in Side::ALL {
                if self.has_wall(row, col, side) {
                    continue;
                }
                if let Some((r, c)) = self.neighbor(row, col, side)
                    && !seen[r * self.cols + c]
                {
                    seen[r * self.cols + c] = true;
                    stack.push((r, c));
                }
            }
        }
        count
    }
}

/// Carves a perfect maze with the recursive backtracker, run on an
/// explicit stack starting from the top-left cell.
pub fn generate(rows: usize, cols: usize, rng: &mut impl Rng) -> Maze {
    let mut maze = Maze::closed(rows, cols);
    if rows == 0 || cols == 0 {
        return maze;
    }

    let mut visited = vec![false; rows * cols];
    let mut stack = vec![(0usize, 0usize)];
    visited[0] = true;

    while let Some(&(row, col)) = stack.last() {
        let candidates: Vec<(Side, usize, usize)> = Side::ALL
            .iter()
            .filter_map(|&side| {
                let (r, c) = maze.neighbor(row, col, side)?;
                (!visited[r * cols + c]).then_some((side, r, c))
            })
            .collect();

        if candidates.is_empty() {
            stack.pop();
            continue;
        }

        let (side, r, c) = candidates[rng.random_range(0..candidates.len())];
        maze.remove_wall(row, col, side);
        maze.remove_wall(r, c, side.opposite());
        visited[r * cols + c] = true;
        stack.push((r, c));
    }

    maze
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn every_cell_is_reachable() {
        for seed in 0..8 {
            let maze = generate(15, 15, &mut SmallRng::seed_from_u64(seed));
            assert_eq!(maze.reachable_count(), 15 * 15);
        }
    }

    #[test]
    fn carves_a_spanning_tree() {
        let maze = generate(9, 13, &mut SmallRng::seed_from_u64(3));
        assert_eq!(maze.passage_count(), 9 * 13 - 1);
    }

    #[test]
    fn outer_boundary_stays_closed() {
        let maze = generate(6, 5, &mut SmallRng::seed_from_u64(11));
        for col in 0..maze.cols {
            assert!(maze.has_wall(0, col, Side::Top));
            assert!(maze.has_wall(maze.rows - 1, col, Side::Bottom));
        }
        for row in 0..maze.rows {
            assert!(maze.has_wall(row, 0, Side::Left));
            assert!(maze.has_wall(row, maze.cols - 1, Side::Right));
        }
    }

    #[test]
    fn shared_walls_agree() {
        let maze = generate(7, 7, &mut SmallRng::seed_from_u64(5));
        for row in 0..maze.rows {
            for col in 0..maze.cols - 1 {
                assert_eq!(
                    maze.has_wall(row, col, Side::Right),
                    maze.has_wall(row, col + 1, Side::Left)
                );
            }
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = generate(10, 10, &mut SmallRng::seed_from_u64(99));
        let b = generate(10, 10, &mut SmallRng::seed_from_u64(99));
        assert_eq!(a.walls, b.walls);
    }

    #[test]
    fn single_cell_maze() {
        let maze = generate(1, 1, &mut SmallRng::seed_from_u64(0));
        assert_eq!(maze.reachable_count(), 1);
        assert_eq!(maze.passage_count(), 0);
    }
}
