//! Process-wide board registry.
//!
//! Boards are single-threaded, so the registry is per thread. Every board
//! reserves its id here when it is constructed and releases it when it is
//! dropped, so two live boards never share an id. Boards handed to
//! [`BoardRegistry::share`] can also be looked up by id until
//! [`BoardRegistry::dispose`].

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use uuid::Uuid;

use crate::board::Board;

/// Shared handle to a board.
pub type BoardHandle = Rc<RefCell<Board>>;

thread_local! {
    static BOARDS: RefCell<HashMap<String, BoardHandle>> = RefCell::new(HashMap::new());
    static LIVE_IDS: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// Lookup of boards by id.
pub struct BoardRegistry;

impl BoardRegistry {
    /// Wrap a board in a shared handle and register it under its id.
    ///
    /// Board ids are unique among live boards, so sharing never replaces
    /// another board.
    pub fn share(board: Board) -> BoardHandle {
        let id = board.id().to_string();
        let handle = Rc::new(RefCell::new(board));
        BOARDS.with(|boards| boards.borrow_mut().insert(id.clone(), handle.clone()));
        log::info!("Board {} registered", id);
        handle
    }

    /// The shared board registered under `id`.
    pub fn get(id: &str) -> Option<BoardHandle> {
        BOARDS.with(|boards| boards.borrow().get(id).cloned())
    }

    /// Whether a shared board is registered under `id`.
    pub fn contains(id: &str) -> bool {
        BOARDS.with(|boards| boards.borrow().contains_key(id))
    }

    /// Remove a board. Handles held elsewhere stay valid.
    pub fn dispose(id: &str) -> Option<BoardHandle> {
        let removed = BOARDS.with(|boards| boards.borrow_mut().remove(id));
        if removed.is_some() {
            log::info!("Board {} disposed", id);
        }
        removed
    }

    /// Registered ids, sorted.
    pub fn ids() -> Vec<String> {
        let mut ids: Vec<String> = BOARDS.with(|boards| boards.borrow().keys().cloned().collect());
        ids.sort();
        ids
    }

    /// Drop every registered board.
    pub fn clear() {
        let boards = BOARDS.with(|boards| std::mem::take(&mut *boards.borrow_mut()));
        drop(boards);
    }

    /// Whether a live board, shared or not, uses `id`.
    pub fn is_live(id: &str) -> bool {
        LIVE_IDS.with(|ids| ids.borrow().contains(id))
    }
}

/// Reserve a board id derived from the container name.
///
/// The container name is used as is unless a live board already has it; a
/// uuid suffix is appended otherwise.
pub(crate) fn reserve_board_id(container: &str) -> String {
    LIVE_IDS.with(|ids| {
        let mut ids = ids.borrow_mut();
        let mut id = container.to_string();
        while ids.contains(&id) {
            let suffix = Uuid::new_v4().simple().to_string();
            id = format!("{}-{}", container, &suffix[..8]);
        }
        ids.insert(id.clone());
        id
    })
}

/// Give up a board id when its board is dropped.
pub(crate) fn release_board_id(id: &str) {
    // The thread-local may already be gone during thread teardown.
    let _ = LIVE_IDS.try_with(|ids| ids.borrow_mut().remove(id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoardOptions, NoRenderer};
    use kurbo::Size;

    fn board(container: &str) -> Board {
        Board::new(
            container,
            Size::new(100.0, 100.0),
            BoardOptions::default(),
            Box::new(NoRenderer),
        )
        .unwrap()
    }

    #[test]
    fn test_share_get_dispose() {
        BoardRegistry::clear();
        let handle = BoardRegistry::share(board("box"));
        assert!(Rc::ptr_eq(&handle, &BoardRegistry::get("box").unwrap()));
        assert_eq!(BoardRegistry::ids(), vec!["box".to_string()]);
        assert!(BoardRegistry::dispose("box").is_some());
        assert!(BoardRegistry::get("box").is_none());
        assert!(BoardRegistry::dispose("box").is_none());
        assert!(BoardRegistry::is_live("box"));
        drop(handle);
        assert!(!BoardRegistry::is_live("box"));
    }

    #[test]
    fn test_unshared_boards_get_distinct_ids() {
        let first = board("same");
        let second = board("same");
        assert_eq!(first.id(), "same");
        assert_ne!(second.id(), "same");
        assert!(second.id().starts_with("same-"));
        assert!(BoardRegistry::is_live(first.id()));
        assert!(BoardRegistry::is_live(second.id()));
        assert!(!BoardRegistry::contains("same"));
    }

    #[test]
    fn test_dropped_board_releases_its_id() {
        let first = board("reuse");
        drop(first);
        assert!(!BoardRegistry::is_live("reuse"));
        assert_eq!(board("reuse").id(), "reuse");
    }

    #[test]
    fn test_shared_ids_stay_unique() {
        BoardRegistry::clear();
        BoardRegistry::share(board("jxg"));
        BoardRegistry::share(board("jxg"));
        let ids = BoardRegistry::ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "jxg");
        assert!(ids[1].starts_with("jxg-"));
        BoardRegistry::clear();
        assert!(!BoardRegistry::is_live("jxg"));
    }
}
