//! Update passes: recompute elements in registration order, then refresh
//! the renderer, run hooks and propagate to dependent boards.

use std::rc::Weak;
use std::cell::RefCell;

use crate::board::Board;
use crate::elements::{Element, UpdateContext};

/// Elements updated after the drag target in a reduced pass.
const REDUCED_UPDATE_HORIZON: i32 = 5;

/// Render quality. Low quality enables reduced updates while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateQuality {
    Low,
    #[default]
    High,
}

/// Counts from the last element pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStats {
    pub updated: usize,
    pub skipped: usize,
}

/// Scheduler state owned by a board.
#[derive(Debug, Default)]
pub struct UpdateScheduler {
    suspend_depth: u32,
    needs_full_update: bool,
    in_update: bool,
    pub quality: UpdateQuality,
    last_stats: UpdateStats,
}

impl UpdateScheduler {
    /// Whether an update transaction is open.
    pub fn is_suspended(&self) -> bool {
        self.suspend_depth > 0
    }

    /// Number of open update transactions.
    pub fn suspend_depth(&self) -> u32 {
        self.suspend_depth
    }

    /// Whether the running pass ignores update opt-outs.
    pub fn needs_full_update(&self) -> bool {
        self.needs_full_update
    }

    /// Counts from the last element pass.
    pub fn last_stats(&self) -> UpdateStats {
        self.last_stats
    }
}

/// Per-pass budget of the reduced update mode.
///
/// The drag target is always admitted and refills the budget. Every other
/// element spends one unit and is skipped once the budget is negative.
#[derive(Debug)]
struct ReducedBudget {
    active: bool,
    remaining: i32,
}

impl ReducedBudget {
    fn new(active: bool) -> Self {
        Self {
            active,
            remaining: 1,
        }
    }

    fn admit(&mut self, is_drag_target: bool) -> bool {
        if !self.active {
            return true;
        }
        if is_drag_target {
            self.remaining = REDUCED_UPDATE_HORIZON;
            return true;
        }
        self.remaining -= 1;
        self.remaining >= 0
    }
}

impl Board {
    /// Skip rule shared by the element and renderer passes.
    fn opted_out(&self, element: &Element) -> bool {
        !self.scheduler.needs_full_update && !element.needs_regular_update && element.rendered_once
    }

    fn reduced_pass(&self) -> bool {
        self.options.reduced_update && self.scheduler.quality == UpdateQuality::Low
    }

    /// Flag every element for recompute.
    pub fn prepare_update(&mut self) {
        for element in self.registry.iter_mut() {
            element.needs_update = true;
        }
    }

    /// Recompute elements in registration order.
    pub fn update_elements(&mut self, drag: Option<&str>) {
        let mut budget = ReducedBudget::new(self.reduced_pass());
        let mut stats = UpdateStats::default();
        let ids = self.registry.ids().to_vec();
        for id in &ids {
            let Some(element) = self.registry.get(id) else {
                continue;
            };
            if self.opted_out(element) {
                stats.skipped += 1;
                continue;
            }
            if !budget.admit(drag == Some(id.as_str())) {
                stats.skipped += 1;
                continue;
            }
            self.recompute(id);
            stats.updated += 1;
        }
        log::debug!(
            "Board {}: updated {} elements, skipped {}",
            self.id,
            stats.updated,
            stats.skipped
        );
        self.scheduler.last_stats = stats;
    }

    fn recompute(&mut self, id: &str) {
        let next = {
            let Some(element) = self.registry.get(id) else {
                return;
            };
            let ctx = UpdateContext::new(&self.registry, &self.cs, id);
            element.routine.run(&ctx, &element.geometry)
        };
        if let Some(element) = self.registry.get_mut(id) {
            element.geometry = next;
            element.needs_update = false;
        }
    }

    /// Refresh renderer nodes with the same traversal and skip rules as
    /// [`Board::update_elements`].
    pub fn update_renderer(&mut self, drag: Option<&str>) {
        let mut budget = ReducedBudget::new(self.reduced_pass());
        let ids = self.registry.ids().to_vec();
        for id in &ids {
            let Some(element) = self.registry.get(id) else {
                continue;
            };
            if self.opted_out(element) || !budget.admit(drag == Some(id.as_str())) {
                continue;
            }
            self.renderer.update_element(element);
            if let Some(element) = self.registry.get_mut(id) {
                element.rendered_once = true;
            }
        }
    }

    /// Run a complete update cycle. Does nothing while suspended.
    ///
    /// `drag` names the element being dragged, which reduced passes always
    /// update.
    pub fn update(&mut self, drag: Option<&str>) {
        if self.scheduler.is_suspended() || self.scheduler.in_update {
            return;
        }
        self.scheduler.in_update = true;
        self.run_cycle(drag);
        self.run_hooks();
        self.scheduler.in_update = false;
        self.update_dependents();
    }

    fn run_cycle(&mut self, drag: Option<&str>) {
        self.prepare_update();
        self.update_elements(drag);
        self.update_conditions(drag);
        self.renderer.suspend_redraw();
        self.update_renderer(drag);
        self.renderer.unsuspend_redraw();
    }

    /// Update every element, including those opted out of regular updates.
    pub fn full_update(&mut self) {
        self.scheduler.needs_full_update = true;
        self.update(None);
        self.scheduler.needs_full_update = false;
    }

    /// Open an update transaction. Transactions nest.
    pub fn suspend_update(&mut self) {
        self.scheduler.suspend_depth += 1;
    }

    /// Close an update transaction. Closing the outermost one runs one
    /// update.
    pub fn unsuspend_update(&mut self) {
        self.scheduler.suspend_depth = self.scheduler.suspend_depth.saturating_sub(1);
        if self.scheduler.suspend_depth == 0 {
            self.update(None);
        }
    }

    /// Whether updates are suspended.
    pub fn is_suspended(&self) -> bool {
        self.scheduler.is_suspended()
    }

    /// Quality of the current update pass.
    pub fn quality(&self) -> UpdateQuality {
        self.scheduler.quality
    }

    /// Set the quality used by the next passes.
    pub fn set_quality(&mut self, quality: UpdateQuality) {
        self.scheduler.quality = quality;
    }

    /// Counts from the last element pass.
    pub fn last_update_stats(&self) -> UpdateStats {
        self.scheduler.last_stats
    }

    fn update_dependents(&mut self) {
        self.dependents.retain(|weak| weak.strong_count() > 0);
        if self.dependents.is_empty() {
            return;
        }
        let me: *const Board = self;
        let quality = self.scheduler.quality;
        let dependents: Vec<Weak<RefCell<Board>>> = self.dependents.clone();
        for weak in dependents {
            let Some(handle) = weak.upgrade() else {
                continue;
            };
            if std::ptr::eq(handle.as_ptr() as *const Board, me) {
                continue;
            }
            match handle.try_borrow_mut() {
                Ok(mut board) => board.run_dependent_cycle(quality),
                Err(_) => log::debug!("Board {}: dependent board is busy, skipped", self.id),
            }
        }
    }

    fn run_dependent_cycle(&mut self, quality: UpdateQuality) {
        if self.scheduler.is_suspended() || self.scheduler.in_update {
            return;
        }
        self.scheduler.in_update = true;
        self.scheduler.quality = quality;
        self.run_cycle(None);
        self.run_hooks();
        self.scheduler.in_update = false;
    }
}
