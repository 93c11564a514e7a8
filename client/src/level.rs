use glam::{Mat4, Vec3};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::collision::{Aabb, ColliderKind, ColliderSet};
use crate::config::*;
use crate::error::LevelError;
use crate::materials::MaterialId;
use crate::maze::{self, Maze, Side};
use crate::mesh::{cylinder, plane};
use crate::models::Model;

/// Side view of the hand-placed course. The last line sits on the ground;
/// each glyph is one block-sized cell centred on z = 0.
///
/// `B` brick, `?` question block, `P` pipe, `C` coin, `S` spawn,
/// `.` or space empty.
pub const CLASSIC_LAYOUT: &str = "
.............BBBBB..........................
..............CCC...........C.C.C...........
............................................
......?...B?B?B..........BB?BB.........BB...
..S.................P.........P.......BBB...
....................P........PP......BBBB...
";

const PIPE_RADIUS: f32 = 0.85;
const PIPE_RIM_RADIUS: f32 = 1.0;
const PIPE_RIM_HEIGHT: f32 = 0.4;
const CLOUD_COUNT: usize = 8;
const MAZE_COIN_HEIGHT: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelKind {
    Classic,
    Maze,
}

impl FromStr for LevelKind {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" => Ok(LevelKind::Classic),
            "maze" => Ok(LevelKind::Maze),
            _ => Err(LevelError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for LevelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelKind::Classic => write!(f, "classic"),
            LevelKind::Maze => write!(f, "maze"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Glyph {
    Empty,
    Brick,
    Question,
    Pipe,
    Coin,
}

/// Parsed layout. `rows[0]` is the bottom row.
#[derive(Debug, PartialEq, Eq)]
pub struct Layout {
    pub rows: Vec<Vec<Glyph>>,
    pub width: usize,
    pub spawn: Option<(usize, usize)>,
}

impl Layout {
    pub fn glyph(&self, row: usize, col: usize) -> Glyph {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(Glyph::Empty)
    }

    /// Centre of a cell in world space.
    pub fn cell_center(&self, row: usize, col: usize) -> Vec3 {
        let x = (col as f32 - (self.width as f32 - 1.0) * 0.5) * BLOCK_SIZE;
        let y = (row as f32 + 0.5) * BLOCK_SIZE;
        Vec3::new(x, y, 0.0)
    }
}

pub fn parse_layout(text: &str) -> Result<Layout, LevelError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .skip_while(|l| l.is_empty())
        .collect();
    let end = lines.iter().rposition(|l| !l.is_empty()).ok_or(LevelError::Empty)?;
    let lines = &lines[..=end];

    let height = lines.len();
    let mut rows = vec![Vec::new(); height];
    let mut spawn: Option<(usize, usize)> = None;
    let mut spawn_line = 0;

    for (line_no, line) in lines.iter().enumerate() {
        let row = height - 1 - line_no;
        for (column, glyph) in line.chars().enumerate() {
            let cell = match glyph {
                '.' | ' ' => Glyph::Empty,
                'B' => Glyph::Brick,
                '?' => Glyph::Question,
                'P' => Glyph::Pipe,
                'C' => Glyph::Coin,
                'S' => {
                    if spawn.is_some() {
                        return Err(LevelError::DuplicateSpawn {
                            first: spawn_line,
                            second: line_no,
                        });
                    }
                    spawn = Some((row, column));
                    spawn_line = line_no;
                    Glyph::Empty
                }
                other => {
                    return Err(LevelError::UnknownGlyph {
                        glyph: other,
                        row: line_no,
                        column,
                    });
                }
            };
            rows[row].push(cell);
        }
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    Ok(Layout { rows, width, spawn })
}

pub struct QuestionBlock {
    pub center: Vec3,
    pub collider: usize,
    pub used: bool,
}

pub struct Cloud {
    pub position: Vec3,
    pub scale: f32,
}

/// Everything the game needs about a level: collision boxes, the static
/// geometry batched per material, and the interactive pieces.
pub struct Level {
    pub kind: LevelKind,
    pub colliders: ColliderSet,
    pub statics: Model,
    pub question_blocks: Vec<QuestionBlock>,
    pub coins: Vec<Vec3>,
    pub clouds: Vec<Cloud>,
    pub spawn: Vec3,
    /// Half the side of the square ground.
    pub half_extent: f32,
}

impl Level {
    pub fn build(kind: LevelKind, rng: &mut impl Rng) -> Result<Self, LevelError> {
        let level = match kind {
            LevelKind::Classic => Self::from_layout(CLASSIC_LAYOUT, rng)?,
            LevelKind::Maze => Self::maze(rng),
        };
        log::info!(
            "Built {} level: {} colliders, {} coins, {} question blocks",
            level.kind,
            level.colliders.len(),
            level.coins.len(),
            level.question_blocks.len()
        );
        Ok(level)
    }

    fn empty(kind: LevelKind, half_extent: f32, rng: &mut impl Rng) -> Self {
        let mut level = Self {
            kind,
            colliders: ColliderSet::new(),
            statics: Model::default(),
            question_blocks: Vec::new(),
            coins: Vec::new(),
            clouds: Vec::new(),
            spawn: DEFAULT_SPAWN,
            half_extent,
        };
        level.add_ground();
        level.scatter_clouds(rng);
        level
    }

    fn add_ground(&mut self) {
        let size = self.half_extent * 2.0;
        self.statics
            .add(&plane(size, 10.0), Mat4::IDENTITY, MaterialId::Ground);
        self.colliders.push(
            Aabb::new(
                Vec3::new(-self.half_extent, -GROUND_THICKNESS, -self.half_extent),
                Vec3::new(self.half_extent, 0.0, self.half_extent),
            ),
            ColliderKind::Ground,
        );
    }

    fn scatter_clouds(&mut self, rng: &mut impl Rng) {
        let h = self.half_extent;
        self.clouds = (0..CLOUD_COUNT)
            .map(|_| Cloud {
                position: Vec3::new(
                    rng.random_range(-h..h),
                    rng.random_range(18.0..26.0),
                    rng.random_range(-h..h),
                ),
                scale: rng.random_range(0.8..1.6),
            })
            .collect();
    }

    fn add_solid(&mut self, bounds: Aabb, kind: ColliderKind, material: MaterialId) -> usize {
        self.statics.add_box(bounds.size(), bounds.center(), material);
        self.colliders.push(bounds, kind)
    }

    pub fn from_layout(text: &str, rng: &mut impl Rng) -> Result<Self, LevelError> {
        let layout = parse_layout(text)?;
        let course_half = layout.width as f32 * BLOCK_SIZE * 0.5;
        let mut level = Self::empty(
            LevelKind::Classic,
            (GROUND_EXTENT * 0.5).max(course_half + BLOCK_SIZE),
            rng,
        );
        let block = Vec3::splat(BLOCK_SIZE);

        for (row, cells) in layout.rows.iter().enumerate() {
            for (col, glyph) in cells.iter().enumerate() {
                let center = layout.cell_center(row, col);
                match glyph {
                    Glyph::Brick => {
                        level.add_solid(
                            Aabb::from_center_size(center, block),
                            ColliderKind::Brick,
                            MaterialId::Brick,
                        );
                    }
                    Glyph::Question => {
                        let collider = level.colliders.push(
                            Aabb::from_center_size(center, block),
                            ColliderKind::QuestionBlock,
                        );
                        level.question_blocks.push(QuestionBlock {
                            center,
                            collider,
                            used: false,
                        });
                    }
                    Glyph::Coin => level.coins.push(center),
                    // Pipes are emitted per column run below.
                    Glyph::Pipe | Glyph::Empty => {}
                }
            }
        }

        for col in 0..layout.width {
            let mut row = 0;
            while row < layout.rows.len() {
                if layout.glyph(row, col) != Glyph::Pipe {
                    row += 1;
                    continue;
                }
                let start = row;
                while layout.glyph(row, col) == Glyph::Pipe {
                    row += 1;
                }
                let bottom = layout.cell_center(start, col) - Vec3::Y * (BLOCK_SIZE * 0.5);
                level.add_pipe(bottom, (row - start) as f32 * BLOCK_SIZE);
            }
        }

        if let Some((row, col)) = layout.spawn {
            level.spawn = layout.cell_center(row, col) - Vec3::Y * (BLOCK_SIZE * 0.5 - 0.5);
        }

        Ok(level)
    }

    fn add_pipe(&mut self, bottom: Vec3, height: f32) {
        let body_height = height - PIPE_RIM_HEIGHT;
        self.statics.add(
            &cylinder(PIPE_RADIUS, body_height, 24),
            Mat4::from_translation(bottom + Vec3::Y * (body_height * 0.5)),
            MaterialId::Pipe,
        );
        self.statics.add(
            &cylinder(PIPE_RIM_RADIUS, PIPE_RIM_HEIGHT, 24),
            Mat4::from_translation(bottom + Vec3::Y * (height - PIPE_RIM_HEIGHT * 0.5)),
            MaterialId::Pipe,
        );
        let half = Vec3::new(PIPE_RIM_RADIUS, 0.0, PIPE_RIM_RADIUS);
        self.colliders.push(
            Aabb::new(bottom - half, bottom + half + Vec3::Y * height),
            ColliderKind::Pipe,
        );
    }

    pub fn maze(rng: &mut impl Rng) -> Self {
        let grid = maze::generate(MAZE_ROWS, MAZE_COLS, rng);
        let width = MAZE_COLS as f32 * MAZE_CELL_SIZE;
        let depth = MAZE_ROWS as f32 * MAZE_CELL_SIZE;
        let mut level = Self::empty(LevelKind::Maze, width.max(depth) * 0.5, rng);
        level.add_maze_walls(&grid, width, depth);
        level.coins = dead_end_coins(&grid, width, depth);
        level
    }

    fn add_maze_walls(&mut self, grid: &Maze, width: f32, depth: f32) {
        let cs = MAZE_CELL_SIZE;
        let h = MAZE_WALL_HEIGHT;
        let t = MAZE_WALL_THICKNESS;
        let along_x = Vec3::new(cs, h, t);
        let along_z = Vec3::new(t, h, cs);
        let pillar = Vec3::new(t, h, t);

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let c = maze_cell_center(row, col, width, depth);
                let mut walls: Vec<(Vec3, Vec3)> = Vec::new();
                if grid.has_wall(row, col, Side::Top) {
                    walls.push((c - Vec3::Z * (cs * 0.5), along_x));
                }
                if row == grid.rows - 1 && grid.has_wall(row, col, Side::Bottom) {
                    walls.push((c + Vec3::Z * (cs * 0.5), along_x));
                }
                if grid.has_wall(row, col, Side::Left) {
                    walls.push((c - Vec3::X * (cs * 0.5), along_z));
                }
                if col == grid.cols - 1 && grid.has_wall(row, col, Side::Right) {
                    walls.push((c + Vec3::X * (cs * 0.5), along_z));
                }
                walls.push((c - Vec3::new(cs * 0.5, 0.0, cs * 0.5), pillar));

                for (center, size) in walls {
                    self.add_solid(
                        Aabb::from_center_size(center, size),
                        ColliderKind::Wall,
                        MaterialId::Wall,
                    );
                }
            }
        }
    }
}

/// Cell centre at wall mid-height, with the grid centred on the origin.
fn maze_cell_center(row: usize, col: usize, width: f32, depth: f32) -> Vec3 {
    Vec3::new(
        col as f32 * MAZE_CELL_SIZE - width * 0.5 + MAZE_CELL_SIZE * 0.5,
        MAZE_WALL_HEIGHT * 0.5,
        row as f32 * MAZE_CELL_SIZE - depth * 0.5 + MAZE_CELL_SIZE * 0.5,
    )
}

/// One coin in every cell enclosed on three sides.
fn dead_end_coins(grid: &Maze, width: f32, depth: f32) -> Vec<Vec3> {
    let mut coins = Vec::new();
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let walls = Side::ALL
                .iter()
                .filter(|&&side| grid.has_wall(row, col, side))
                .count();
            if walls == 3 {
                let c = maze_cell_center(row, col, width, depth);
                coins.push(Vec3::new(c.x, MAZE_COIN_HEIGHT, c.z));
            }
        }
    }
    coins
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(2024)
    }

    #[test]
    fn level_kind_parses_case_insensitively() {
        assert_eq!("Maze".parse::<LevelKind>(), Ok(LevelKind::Maze));
        assert_eq!("classic".parse::<LevelKind>(), Ok(LevelKind::Classic));
        assert_eq!(
            "castle".parse::<LevelKind>(),
            Err(LevelError::UnknownKind("castle".into()))
        );
        assert_eq!(LevelKind::Maze.to_string(), "maze");
    }

    #[test]
    fn parses_rows_bottom_up() {
        let layout = parse_layout("\n.C.\nB?P\n").unwrap();
        assert_eq!(layout.width, 3);
        assert_eq!(layout.rows[0], vec![Glyph::Brick, Glyph::Question, Glyph::Pipe]);
        assert_eq!(layout.glyph(1, 1), Glyph::Coin);
        assert_eq!(layout.glyph(5, 5), Glyph::Empty);
        assert_eq!(layout.spawn, None);
    }

    #[test]
    fn ragged_rows_are_padded_with_empty() {
        let layout = parse_layout("B\nBBBB").unwrap();
        assert_eq!(layout.width, 4);
        assert_eq!(layout.glyph(1, 3), Glyph::Empty);
        assert_eq!(layout.glyph(0, 3), Glyph::Brick);
    }

    #[test]
    fn rejects_unknown_glyph_with_position() {
        let err = parse_layout("..\n.x").unwrap_err();
        assert_eq!(
            err,
            LevelError::UnknownGlyph {
                glyph: 'x',
                row: 1,
                column: 1
            }
        );
    }

    #[test]
    fn rejects_second_spawn() {
        let err = parse_layout("S.\n.S").unwrap_err();
        assert_eq!(err, LevelError::DuplicateSpawn { first: 0, second: 1 });
    }

    #[test]
    fn rejects_blank_layout() {
        assert_eq!(parse_layout("\n   \n"), Err(LevelError::Empty));
    }

    #[test]
    fn cell_centers_are_symmetric_and_on_the_ground() {
        let layout = parse_layout("...").unwrap();
        assert_eq!(layout.cell_center(0, 1), Vec3::new(0.0, BLOCK_SIZE * 0.5, 0.0));
        assert_eq!(layout.cell_center(0, 0).x, -layout.cell_center(0, 2).x);
    }

    #[test]
    fn classic_level_is_consistent() {
        let level = Level::build(LevelKind::Classic, &mut rng()).unwrap();
        let layout = parse_layout(CLASSIC_LAYOUT).unwrap();

        assert!(!level.coins.is_empty());
        assert!(!level.question_blocks.is_empty());
        for block in &level.question_blocks {
            let collider = level.colliders.get(block.collider).unwrap();
            assert_eq!(collider.kind, ColliderKind::QuestionBlock);
            assert_eq!(collider.bounds.center(), block.center);
        }

        let (row, col) = layout.spawn.unwrap();
        assert_eq!(level.spawn.x, layout.cell_center(row, col).x);
        let spawn_box = Aabb::from_feet(level.spawn, PLAYER_SIZE);
        assert!(!level.colliders.overlaps_any(&spawn_box));

        let ground = level.colliders.get(0).unwrap();
        assert_eq!(ground.kind, ColliderKind::Ground);
        assert_eq!(ground.bounds.max.y, 0.0);
    }

    #[test]
    fn stacked_pipes_merge_into_one_collider() {
        let level = Level::from_layout("P.\nP.\nPP", &mut rng()).unwrap();
        let pipes: Vec<_> = level
            .colliders
            .iter()
            .filter(|c| c.kind == ColliderKind::Pipe)
            .collect();
        assert_eq!(pipes.len(), 2);
        let tallest = pipes.iter().map(|c| c.bounds.max.y).fold(0.0, f32::max);
        assert_eq!(tallest, 3.0 * BLOCK_SIZE);
        assert!(pipes.iter().all(|c| c.bounds.min.y == 0.0));
    }

    #[test]
    fn maze_walls_stay_inside_ground_and_leave_spawn_clear() {
        let level = Level::build(LevelKind::Maze, &mut rng()).unwrap();
        let h = level.half_extent + MAZE_WALL_THICKNESS;
        for collider in level.colliders.iter() {
            assert!(collider.bounds.min.x >= -h && collider.bounds.max.x <= h);
            assert!(collider.bounds.min.z >= -h && collider.bounds.max.z <= h);
        }
        let spawn_box = Aabb::from_feet(level.spawn, PLAYER_SIZE);
        assert!(!level.colliders.overlaps_any(&spawn_box));
        assert!(!level.coins.is_empty());
    }

    #[test]
    fn maze_wall_count_matches_grid() {
        let mut rng = rng();
        let grid = maze::generate(MAZE_ROWS, MAZE_COLS, &mut rng.clone());
        let level = Level::maze(&mut rng);

        let mut expected = MAZE_ROWS * MAZE_COLS; // pillars
        for row in 0..MAZE_ROWS {
            for col in 0..MAZE_COLS {
                expected += grid.has_wall(row, col, Side::Top) as usize;
                expected += grid.has_wall(row, col, Side::Left) as usize;
            }
        }
        expected += MAZE_COLS + MAZE_ROWS; // closed outer bottom and right edges
        let walls = level
            .colliders
            .iter()
            .filter(|c| c.kind == ColliderKind::Wall)
            .count();
        assert_eq!(walls, expected);
    }
}
