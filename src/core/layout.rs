//! State grid geometry and the transient input state of an editor window.

use std::collections::BTreeSet;

use dmi_host::{Bounds, PointerButton, PointerEvent, Point, Size};

use crate::config::CanvasConfig;

/// One cell of the state grid. The trailing cell creates a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridCell {
    State(usize),
    NewState,
}

/// Row-major grid of state previews sized to the canvas width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateGrid {
    canvas: Size,
    cell: Size,
    columns: u32,
    states: usize,
    scroll_step: u32,
    /// False while no document is loaded; the grid then has no cells at all.
    populated: bool,
}

impl StateGrid {
    pub fn empty(canvas: Size) -> Self {
        Self {
            canvas,
            ..Self::default()
        }
    }

    pub fn layout(canvas: Size, icon: Size, states: usize, config: &CanvasConfig) -> Self {
        let cell = Size::new(
            icon.width + config.cell_padding * 2,
            icon.height + config.label_height + config.cell_padding * 2,
        );
        let columns = if cell.width == 0 {
            1
        } else {
            (canvas.width / cell.width).max(1)
        };

        Self {
            canvas,
            cell,
            columns,
            states,
            scroll_step: config.scroll_step,
            populated: true,
        }
    }

    pub fn cell_count(&self) -> usize {
        if self.populated {
            self.states + 1
        } else {
            0
        }
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn content_height(&self) -> u32 {
        let count = self.cell_count() as u32;
        if count == 0 {
            return 0;
        }
        count.div_ceil(self.columns) * self.cell.height
    }

    pub fn max_scroll(&self) -> u32 {
        self.content_height().saturating_sub(self.canvas.height)
    }

    fn index_of(&self, cell: GridCell) -> Option<usize> {
        let index = match cell {
            GridCell::State(index) if index < self.states => index,
            GridCell::State(_) => return None,
            GridCell::NewState => self.states,
        };
        (index < self.cell_count()).then_some(index)
    }

    fn cell_at_index(&self, index: usize) -> Option<GridCell> {
        if index >= self.cell_count() {
            None
        } else if index == self.states {
            Some(GridCell::NewState)
        } else {
            Some(GridCell::State(index))
        }
    }

    /// Canvas rectangle of `cell` with the grid scrolled by `scroll` pixels.
    pub fn rect(&self, cell: GridCell, scroll: u32) -> Option<Bounds> {
        let index = self.index_of(cell)? as u32;
        let column = index % self.columns;
        let row = index / self.columns;
        let x = (column * self.cell.width) as i32;
        let y = (row * self.cell.height) as i32 - scroll as i32;
        Some(Bounds::new(x, y, self.cell.width, self.cell.height))
    }

    pub fn hit_test(&self, point: Point, scroll: u32) -> Option<GridCell> {
        if point.x < 0 || point.y < 0 || self.cell.width == 0 || self.cell.height == 0 {
            return None;
        }

        let x = point.x as u32;
        let y = point.y as u32 + scroll;
        let column = x / self.cell.width;
        if column >= self.columns {
            return None;
        }
        let row = y / self.cell.height;
        self.cell_at_index((row * self.columns + column) as usize)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerState {
    pub position: Option<Point>,
    pub pressed: Option<PointerButton>,
    pub pressed_on: Option<GridCell>,
}

/// Something the user asked for through the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    OpenState(usize),
    NewState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputOutcome {
    pub repaint: bool,
    pub activation: Option<Activation>,
}

/// Transient UI state of one editor window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub scroll: u32,
    pub focused: Option<GridCell>,
    pub hovering: BTreeSet<GridCell>,
    pub pointer: PointerState,
}

impl ViewState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drops focus/hover entries that no longer exist and clamps the scroll offset.
    pub fn fit_to(&mut self, grid: &StateGrid) {
        self.scroll = self.scroll.min(grid.max_scroll());
        self.hovering.retain(|cell| grid.rect(*cell, 0).is_some());
        if self.focused.is_some_and(|cell| grid.rect(cell, 0).is_none()) {
            self.focused = None;
        }
    }

    pub fn apply(&mut self, grid: &StateGrid, event: PointerEvent) -> InputOutcome {
        match event {
            PointerEvent::Move { position } => {
                self.pointer.position = Some(position);
                InputOutcome {
                    repaint: self.update_hover(grid, position),
                    activation: None,
                }
            }
            PointerEvent::Down {
                position,
                button,
                double_click,
            } => {
                self.pointer.position = Some(position);
                self.pointer.pressed = Some(button);
                let hit = grid.hit_test(position, self.scroll);
                self.pointer.pressed_on = hit;

                let mut outcome = InputOutcome {
                    repaint: self.update_hover(grid, position),
                    activation: None,
                };
                if button == PointerButton::Left && self.focused != hit {
                    self.focused = hit;
                    outcome.repaint = true;
                }
                if let (true, Some(GridCell::State(index))) = (double_click, hit) {
                    outcome.activation = Some(Activation::OpenState(index));
                }
                outcome
            }
            PointerEvent::Up { position, button } => {
                let pressed_on = self.pointer.pressed_on.take();
                self.pointer.pressed = None;
                self.pointer.position = Some(position);
                let hit = grid.hit_test(position, self.scroll);

                let activation = (button == PointerButton::Left
                    && hit == Some(GridCell::NewState)
                    && pressed_on == hit)
                    .then_some(Activation::NewState);
                InputOutcome {
                    repaint: self.update_hover(grid, position),
                    activation,
                }
            }
            PointerEvent::Wheel { position, delta } => {
                let step = delta.unsigned_abs().saturating_mul(grid.scroll_step.max(1));
                let scroll = if delta >= 0 {
                    self.scroll.saturating_add(step)
                } else {
                    self.scroll.saturating_sub(step)
                }
                .min(grid.max_scroll());
                let scrolled = scroll != self.scroll;
                self.scroll = scroll;
                let hovered = self.update_hover(grid, position);
                InputOutcome {
                    repaint: scrolled || hovered,
                    activation: None,
                }
            }
        }
    }

    fn update_hover(&mut self, grid: &StateGrid, position: Point) -> bool {
        let hovering: BTreeSet<GridCell> =
            grid.hit_test(position, self.scroll).into_iter().collect();
        if hovering == self.hovering {
            return false;
        }
        self.hovering = hovering;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(states: usize) -> StateGrid {
        // 40x52 cells, 3 columns in a 130 px wide canvas.
        StateGrid::layout(
            Size::new(130, 100),
            Size::new(32, 32),
            states,
            &CanvasConfig::default(),
        )
    }

    #[test]
    fn layout_wraps_cells_and_appends_the_new_state_cell() {
        let grid = grid(4);
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.cell_count(), 5);
        assert_eq!(grid.rect(GridCell::State(0), 0), Some(Bounds::new(0, 0, 40, 52)));
        assert_eq!(grid.rect(GridCell::NewState, 0), Some(Bounds::new(40, 52, 40, 52)));
        assert_eq!(grid.rect(GridCell::State(4), 0), None);
        assert_eq!(grid.content_height(), 104);
        assert_eq!(grid.max_scroll(), 4);
    }

    #[test]
    fn empty_grid_has_no_cells() {
        let grid = StateGrid::empty(Size::new(130, 100));
        assert_eq!(grid.cell_count(), 0);
        assert_eq!(grid.hit_test(Point::new(1, 1), 0), None);
        assert_eq!(grid.max_scroll(), 0);
    }

    #[test]
    fn hit_test_accounts_for_scroll() {
        let grid = grid(4);
        assert_eq!(grid.hit_test(Point::new(45, 10), 0), Some(GridCell::State(1)));
        assert_eq!(grid.hit_test(Point::new(45, 50), 4), Some(GridCell::NewState));
        assert_eq!(grid.hit_test(Point::new(125, 10), 0), None);
        assert_eq!(grid.hit_test(Point::new(-1, 10), 0), None);
    }

    #[test]
    fn double_click_opens_and_press_focuses() {
        let grid = grid(2);
        let mut view = ViewState::default();

        let outcome = view.apply(
            &grid,
            PointerEvent::Down {
                position: Point::new(5, 5),
                button: PointerButton::Left,
                double_click: true,
            },
        );

        assert_eq!(outcome.activation, Some(Activation::OpenState(0)));
        assert!(outcome.repaint);
        assert_eq!(view.focused, Some(GridCell::State(0)));
        assert!(view.hovering.contains(&GridCell::State(0)));
    }

    #[test]
    fn click_release_on_the_new_state_cell_activates_it() {
        let grid = grid(2);
        let mut view = ViewState::default();
        let position = Point::new(85, 5);

        view.apply(
            &grid,
            PointerEvent::Down {
                position,
                button: PointerButton::Left,
                double_click: false,
            },
        );
        let outcome = view.apply(
            &grid,
            PointerEvent::Up {
                position,
                button: PointerButton::Left,
            },
        );

        assert_eq!(outcome.activation, Some(Activation::NewState));
        assert_eq!(view.pointer.pressed, None);
    }

    #[test]
    fn wheel_scroll_is_clamped_to_content() {
        let grid = grid(7);
        let mut view = ViewState::default();

        let outcome = view.apply(
            &grid,
            PointerEvent::Wheel {
                position: Point::new(5, 5),
                delta: 10,
            },
        );
        assert!(outcome.repaint);
        assert_eq!(view.scroll, grid.max_scroll());

        view.apply(
            &grid,
            PointerEvent::Wheel {
                position: Point::new(5, 5),
                delta: -10,
            },
        );
        assert_eq!(view.scroll, 0);
    }

    #[test]
    fn fit_to_drops_cells_that_no_longer_exist() {
        let mut view = ViewState {
            scroll: 500,
            focused: Some(GridCell::State(5)),
            ..ViewState::default()
        };
        view.hovering.insert(GridCell::State(6));

        view.fit_to(&grid(2));

        assert_eq!(view.scroll, 0);
        assert_eq!(view.focused, None);
        assert!(view.hovering.is_empty());
    }
}
