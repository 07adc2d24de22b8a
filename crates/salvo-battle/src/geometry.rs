//! Board geometry: ship placement, hit detection, and wreck fringes.
//!
//! All functions here are pure. The board is `BOARD_SIZE` × `BOARD_SIZE`
//! with `(0, 0)` in the top-left corner; horizontal ships grow along `x`,
//! vertical ships along `y`.

use salvo_protocol::{AttackStatus, Orientation, Position, ShipLayout};

/// Width and height of the board.
pub const BOARD_SIZE: u8 = 10;

/// Returns `true` if the position lies on the board.
pub fn in_bounds(pos: Position) -> bool {
    pos.x < BOARD_SIZE && pos.y < BOARD_SIZE
}

/// Every cell of the board, row by row.
pub fn all_cells() -> impl Iterator<Item = Position> {
    (0..BOARD_SIZE).flat_map(|y| (0..BOARD_SIZE).map(move |x| Position::new(x, y)))
}

/// A ship on a player's board, with per-cell damage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    layout: ShipLayout,

    /// One flag per cell, indexed by offset from the origin along the
    /// ship's axis. `false` means that cell has been hit.
    alive_cells: Vec<bool>,
}

impl Ship {
    /// Places an undamaged ship.
    pub fn new(layout: ShipLayout) -> Self {
        let alive_cells = vec![true; usize::from(layout.length)];
        Self {
            layout,
            alive_cells,
        }
    }

    pub fn layout(&self) -> &ShipLayout {
        &self.layout
    }

    /// The offset of `pos` along this ship, if the ship covers it.
    pub fn offset_of(&self, pos: Position) -> Option<usize> {
        let origin = self.layout.position;
        let (along, across, origin_along, origin_across) = match self.layout.orientation {
            Orientation::Horizontal => (pos.x, pos.y, origin.x, origin.y),
            Orientation::Vertical => (pos.y, pos.x, origin.y, origin.x),
        };
        if across != origin_across || along < origin_along {
            return None;
        }
        let offset = usize::from(along - origin_along);
        (offset < self.alive_cells.len()).then_some(offset)
    }

    /// The cells this ship covers, origin first.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        let origin = self.layout.position;
        (0..self.layout.length).filter_map(move |k| match self.layout.orientation {
            Orientation::Horizontal => origin.x.checked_add(k).map(|x| Position::new(x, origin.y)),
            Orientation::Vertical => origin.y.checked_add(k).map(|y| Position::new(origin.x, y)),
        })
    }

    /// Marks the cell at `pos` as hit.
    ///
    /// Returns `None` if the ship doesn't cover `pos`, otherwise
    /// [`AttackStatus::Killed`] when this was the last live cell and
    /// [`AttackStatus::Shot`] when some remain.
    pub fn strike(&mut self, pos: Position) -> Option<AttackStatus> {
        let offset = self.offset_of(pos)?;
        self.alive_cells[offset] = false;
        if self.is_sunk() {
            Some(AttackStatus::Killed)
        } else {
            Some(AttackStatus::Shot)
        }
    }

    pub fn is_sunk(&self) -> bool {
        self.alive_cells.iter().all(|alive| !alive)
    }

    /// The on-board cells touching the ship (including diagonally) that
    /// are not part of it, row by row.
    ///
    /// Once a ship is sunk nothing can occupy these cells, so they are
    /// revealed to the attacker as misses.
    pub fn fringe(&self) -> Vec<Position> {
        let origin = self.layout.position;
        let length = i16::from(self.layout.length);
        let (width, height) = match self.layout.orientation {
            Orientation::Horizontal => (length, 1),
            Orientation::Vertical => (1, length),
        };
        let (x0, y0) = (i16::from(origin.x), i16::from(origin.y));
        let size = i16::from(BOARD_SIZE);

        let mut ring = Vec::new();
        for y in (y0 - 1)..=(y0 + height) {
            for x in (x0 - 1)..=(x0 + width) {
                if !(0..size).contains(&x) || !(0..size).contains(&y) {
                    continue;
                }
                // Both fit in u8: they were just checked against the board.
                let pos = Position::new(x as u8, y as u8);
                if self.offset_of(pos).is_none() {
                    ring.push(pos);
                }
            }
        }
        ring
    }
}
