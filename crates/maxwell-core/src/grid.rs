//! The cell grid and the 3x3 neighborhood view genes match against.

use crate::orientation::Orientation;
use crate::signal::Emission;
use crate::ParticleId;

/// One grid cell: the particles bucketed into it this tick plus the
/// emissions delivered to it.
#[derive(Debug, Default, Clone)]
pub struct Cell {
    pub particles: Vec<ParticleId>,
    pub absorbed: Vec<Emission>,
}

/// Dense cell grid covering the world.
#[derive(Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
        }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            None
        } else {
            Some(y as usize * self.width + x as usize)
        }
    }

    #[must_use]
    pub fn coords_of(&self, index: usize) -> (i32, i32) {
        ((index % self.width) as i32, (index / self.width) as i32)
    }

    #[must_use]
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index(x, y).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        self.index(x, y).map(move |i| &mut self.cells[i])
    }

    pub fn cell_mut_by_index(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    /// Bucket coordinates for a world position, `None` outside the grid.
    /// The cast truncates toward zero, matching the bucketing the
    /// automaton has always used.
    #[must_use]
    pub fn bucket(&self, x: f64, y: f64) -> Option<(i32, i32)> {
        let cx = x as i32;
        let cy = y as i32;
        self.index(cx, cy).map(|_| (cx, cy))
    }

    /// Deliver an emission; targets outside the grid are dropped.
    pub fn absorb(&mut self, x: i32, y: i32, emission: Emission) {
        if let Some(cell) = self.cell_mut(x, y) {
            cell.absorbed.push(emission);
        }
    }

    /// Clear every bucket and absorbed emission.
    pub fn reset(&mut self) {
        for cell in &mut self.cells {
            cell.particles.clear();
            cell.absorbed.clear();
        }
    }
}

/// A 3x3 window onto the grid, centered on one cell, carrying the frame
/// of the particle currently observing it.
///
/// Cells beyond the world boundary are absent; a gene constraint that
/// lands on an absent cell can never match.
#[derive(Debug)]
pub struct Neighborhood<'a> {
    cells: [[Option<&'a Cell>; 3]; 3],
    frame: Orientation,
}

impl<'a> Neighborhood<'a> {
    /// Collect the window centered on `(x, y)`.
    #[must_use]
    pub fn gather(grid: &'a Grid, x: i32, y: i32) -> Self {
        let mut cells = [[None; 3]; 3];
        for dx in -1..=1 {
            for dy in -1..=1 {
                cells[(dx + 1) as usize][(dy + 1) as usize] = grid.cell(x + dx, y + dy);
            }
        }
        Self {
            cells,
            frame: Orientation::default(),
        }
    }

    pub fn set_frame(&mut self, frame: Orientation) {
        self.frame = frame;
    }

    #[must_use]
    pub fn frame(&self) -> Orientation {
        self.frame
    }

    /// The center cell, which always exists for a gathered window.
    #[must_use]
    pub fn center(&self) -> Option<&'a Cell> {
        self.cells[1][1]
    }

    /// Cell at a frame-relative offset, after rotating and mirroring the
    /// offset into world coordinates.
    #[must_use]
    pub fn cell_at(&self, dx: i32, dy: i32) -> Option<&'a Cell> {
        let (wx, wy) = self.frame.transform_offset(dx, dy);
        self.cell_at_world(wx, wy)
    }

    /// Cell at a world-relative offset within the window.
    #[must_use]
    pub fn cell_at_world(&self, dx: i32, dy: i32) -> Option<&'a Cell> {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            return None;
        }
        self.cells[(dx + 1) as usize][(dy + 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Direction;

    #[test]
    fn corner_window_is_truncated() {
        let grid = Grid::new(4, 4);
        let hood = Neighborhood::gather(&grid, 0, 0);
        assert!(hood.center().is_some());
        assert!(hood.cell_at_world(-1, 0).is_none());
        assert!(hood.cell_at_world(0, -1).is_none());
        assert!(hood.cell_at_world(1, 1).is_some());
    }

    #[test]
    fn frame_rotation_redirects_lookups() {
        let grid = Grid::new(4, 4);
        let mut hood = Neighborhood::gather(&grid, 0, 1);
        hood.set_frame(Orientation::facing(Direction::West));
        // Frame-north points west, which is off the grid from x = 0.
        assert!(hood.cell_at(0, 1).is_none());
        // Frame-south points east, which exists.
        assert!(hood.cell_at(0, -1).is_some());
    }

    #[test]
    fn bucket_truncates_and_bounds_checks() {
        let grid = Grid::new(4, 4);
        assert_eq!(grid.bucket(1.9, 3.2), Some((1, 3)));
        assert_eq!(grid.bucket(4.0, 1.0), None);
        assert_eq!(grid.bucket(-0.5, 1.0), Some((0, 1)));
    }

    #[test]
    fn absorb_drops_out_of_grid_targets() {
        let mut grid = Grid::new(2, 2);
        let emission = Emission::inert();
        grid.absorb(5, 0, emission.clone());
        grid.absorb(1, 1, emission);
        assert!(grid.cell(1, 1).unwrap().absorbed.len() == 1);
        let total: usize = (0..grid.cell_count())
            .map(|i| {
                let (x, y) = grid.coords_of(i);
                grid.cell(x, y).unwrap().absorbed.len()
            })
            .sum();
        assert_eq!(total, 1);
    }
}
