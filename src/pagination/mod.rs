//! Paginated embed views driven by button presses.
//!
//! Component ids have the form `paginator:{uuid}:{action}` where action is one of
//! `previous`, `next`, `page` (open the jump modal) or `jump` (modal submission).

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;
use uuid::Uuid;

use crate::errors::AppError;
use crate::messaging::{Button, Embed, Modal, Reply};

pub const COMPONENT_PREFIX: &str = "paginator";

const NOT_ALLOWED: &str = "You do not have permission to interact with this menu.";
const INVALID_PAGE: &str = "That page number is invalid.";
const INACTIVE: &str = "This menu is no longer active.";

/// Navigation requested by a component event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Previous,
    Next,
    OpenJump,
    Jump,
}

impl PageAction {
    fn as_str(&self) -> &'static str {
        match self {
            PageAction::Previous => "previous",
            PageAction::Next => "next",
            PageAction::OpenJump => "page",
            PageAction::Jump => "jump",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "previous" => Some(PageAction::Previous),
            "next" => Some(PageAction::Next),
            "page" => Some(PageAction::OpenJump),
            "jump" => Some(PageAction::Jump),
            _ => None,
        }
    }
}

fn component_id(id: Uuid, action: PageAction) -> String {
    format!("{}:{}:{}", COMPONENT_PREFIX, id, action.as_str())
}

/// Split a component id into the paginator id and action.
pub fn parse_component_id(custom_id: &str) -> Option<(Uuid, PageAction)> {
    let mut parts = custom_id.splitn(3, ':');
    if parts.next()? != COMPONENT_PREFIX {
        return None;
    }
    let id = Uuid::parse_str(parts.next()?).ok()?;
    let action = PageAction::parse(parts.next()?)?;
    Some((id, action))
}

/// A sequence of embeds with a cursor. `index` is always in range.
#[derive(Debug, Clone)]
pub struct Paginator {
    id: Uuid,
    pages: Vec<Embed>,
    index: usize,
    author: Option<u64>,
}

impl Paginator {
    /// `author`, when set, is the only user allowed to navigate.
    pub fn new(pages: Vec<Embed>, index: usize, author: Option<u64>) -> Result<Self, AppError> {
        if pages.is_empty() {
            return Err(AppError::InvalidInput(
                "A paginator needs at least one page.".to_string(),
            ));
        }
        let index = index.min(pages.len() - 1);
        Ok(Self {
            id: Uuid::new_v4(),
            pages,
            index,
            author,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn current(&self) -> &Embed {
        &self.pages[self.index]
    }

    fn authorize(&self, actor_id: u64) -> Result<(), AppError> {
        match self.author {
            Some(author) if author != actor_id => {
                Err(AppError::PermissionDenied(NOT_ALLOWED.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Move to `index` if it exists; anything else is ignored.
    pub fn set_index(&mut self, index: i64) -> bool {
        if index < 0 || index as usize >= self.pages.len() {
            return false;
        }
        self.index = index as usize;
        true
    }

    pub fn previous(&mut self, actor_id: u64) -> Result<(), AppError> {
        self.authorize(actor_id)?;
        self.set_index(self.index as i64 - 1);
        Ok(())
    }

    pub fn next(&mut self, actor_id: u64) -> Result<(), AppError> {
        self.authorize(actor_id)?;
        self.set_index(self.index as i64 + 1);
        Ok(())
    }

    /// Jump to a 1-based page number typed by the user.
    pub fn jump_to(&mut self, actor_id: u64, input: &str) -> Result<(), AppError> {
        self.authorize(actor_id)?;
        let input = input.trim();
        if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput(INVALID_PAGE.to_string()));
        }
        // All-digit strings only fail to parse on overflow, which is out of range anyway.
        if let Ok(page) = input.parse::<i64>() {
            self.set_index(page - 1);
        }
        Ok(())
    }

    /// Current page with the navigation buttons.
    pub fn render(&self) -> Reply {
        let last = self.pages.len() - 1;
        Reply {
            buttons: vec![
                Button::emoji(component_id(self.id, PageAction::Previous), "◀")
                    .disabled(self.index == 0),
                Button::emoji(component_id(self.id, PageAction::OpenJump), "🔢"),
                Button::emoji(component_id(self.id, PageAction::Next), "▶")
                    .disabled(self.index == last),
            ],
            ..Reply::embed(self.current().clone())
        }
    }

    fn jump_modal(&self) -> Modal {
        Modal {
            custom_id: component_id(self.id, PageAction::Jump),
            title: "Skip to Page".to_string(),
            label: "Page".to_string(),
        }
    }
}

/// What to send back for a component event.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    /// Edit the paginated message.
    Update(Reply),
    /// Ask for a page number.
    Modal(Modal),
}

/// Live paginators. Views never time out; once more than `capacity` are open, the least
/// recently used one is evicted and answers with an inactive-menu error.
pub struct PaginatorRegistry {
    views: Mutex<LruCache<Uuid, Paginator>>,
}

impl PaginatorRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            views: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<Uuid, Paginator>> {
        self.views.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a paginator and return its first message.
    pub fn open(
        &self,
        pages: Vec<Embed>,
        index: usize,
        author: Option<u64>,
    ) -> Result<Reply, AppError> {
        let paginator = Paginator::new(pages, index, author)?;
        let reply = paginator.render();
        tracing::debug!(
            paginator_id = %paginator.id(),
            pages = paginator.len(),
            "Opened paginator"
        );
        self.lock().put(paginator.id(), paginator);
        Ok(reply)
    }

    /// Apply a component event to the paginator it targets.
    pub fn handle(
        &self,
        custom_id: &str,
        actor_id: u64,
        value: Option<&str>,
    ) -> Result<PageResponse, AppError> {
        let (id, action) = parse_component_id(custom_id)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown component: {}", custom_id)))?;

        let mut views = self.lock();
        let paginator = views
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(INACTIVE.to_string()))?;

        match action {
            PageAction::Previous => paginator.previous(actor_id)?,
            PageAction::Next => paginator.next(actor_id)?,
            PageAction::OpenJump => {
                paginator.authorize(actor_id)?;
                return Ok(PageResponse::Modal(paginator.jump_modal()));
            }
            PageAction::Jump => paginator.jump_to(actor_id, value.unwrap_or_default())?,
        }

        Ok(PageResponse::Update(paginator.render()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(n: usize) -> Vec<Embed> {
        (1..=n).map(|i| Embed::text(format!("page {}", i))).collect()
    }

    fn disabled(reply: &Reply) -> (bool, bool) {
        (reply.buttons[0].disabled, reply.buttons[2].disabled)
    }

    #[test]
    fn test_new_rejects_empty_and_clamps() {
        assert!(matches!(
            Paginator::new(vec![], 0, None),
            Err(AppError::InvalidInput(_))
        ));
        let p = Paginator::new(pages(3), 10, None).unwrap();
        assert_eq!(p.index(), 2);
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut p = Paginator::new(pages(3), 0, None).unwrap();
        p.previous(1).unwrap();
        assert_eq!(p.index(), 0);
        p.next(1).unwrap();
        p.next(1).unwrap();
        p.next(1).unwrap();
        assert_eq!(p.index(), 2);
        assert!(!p.set_index(-1));
        assert!(!p.set_index(3));
        assert_eq!(p.index(), 2);
    }

    #[test]
    fn test_button_states() {
        let mut p = Paginator::new(pages(3), 0, None).unwrap();
        assert_eq!(disabled(&p.render()), (true, false));
        p.next(1).unwrap();
        assert_eq!(disabled(&p.render()), (false, false));
        p.next(1).unwrap();
        assert_eq!(disabled(&p.render()), (false, true));

        let single = Paginator::new(pages(1), 0, None).unwrap();
        assert_eq!(disabled(&single.render()), (true, true));
    }

    #[test]
    fn test_author_restriction() {
        let mut p = Paginator::new(pages(3), 1, Some(7)).unwrap();

        let err = p.next(8).unwrap_err();
        assert_eq!(err.message(), NOT_ALLOWED);
        assert!(p.previous(8).is_err());
        assert!(p.jump_to(8, "3").is_err());
        assert_eq!(p.index(), 1);

        p.next(7).unwrap();
        assert_eq!(p.index(), 2);
    }

    #[test]
    fn test_jump_to() {
        let mut p = Paginator::new(pages(5), 0, None).unwrap();
        p.jump_to(1, "4").unwrap();
        assert_eq!(p.index(), 3);

        let err = p.jump_to(1, "four").unwrap_err();
        assert_eq!(err.message(), INVALID_PAGE);
        assert!(p.jump_to(1, "-1").is_err());
        assert_eq!(p.index(), 3);

        p.jump_to(1, "0").unwrap();
        p.jump_to(1, "99").unwrap();
        p.jump_to(1, "99999999999999999999999").unwrap();
        assert_eq!(p.index(), 3);
    }

    #[test]
    fn test_component_ids_round_trip() {
        let p = Paginator::new(pages(2), 0, None).unwrap();
        let reply = p.render();
        let parsed: Vec<_> = reply
            .buttons
            .iter()
            .map(|b| parse_component_id(&b.custom_id).unwrap())
            .collect();
        assert_eq!(
            parsed,
            vec![
                (p.id(), PageAction::Previous),
                (p.id(), PageAction::OpenJump),
                (p.id(), PageAction::Next)
            ]
        );
        assert!(parse_component_id("other:abc:next").is_none());
        assert!(parse_component_id("paginator:not-a-uuid:next").is_none());
    }

    #[test]
    fn test_registry_routes_events() {
        let registry = PaginatorRegistry::new(10);
        let reply = registry.open(pages(3), 0, Some(7)).unwrap();
        let next_id = reply.buttons[2].custom_id.clone();
        let page_id = reply.buttons[1].custom_id.clone();

        match registry.handle(&next_id, 7, None).unwrap() {
            PageResponse::Update(reply) => assert_eq!(reply.description(), Some("page 2")),
            other => panic!("unexpected response {:?}", other),
        }

        let modal = match registry.handle(&page_id, 7, None).unwrap() {
            PageResponse::Modal(modal) => modal,
            other => panic!("unexpected response {:?}", other),
        };
        assert_eq!(modal.title, "Skip to Page");

        match registry.handle(&modal.custom_id, 7, Some("3")).unwrap() {
            PageResponse::Update(reply) => assert_eq!(reply.description(), Some("page 3")),
            other => panic!("unexpected response {:?}", other),
        }

        assert!(matches!(
            registry.handle(&page_id, 8, None),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_registry_evicts_oldest_view() {
        let registry = PaginatorRegistry::new(1);
        let first = registry.open(pages(2), 0, None).unwrap();
        registry.open(pages(2), 0, None).unwrap();
        assert_eq!(registry.len(), 1);

        let err = registry
            .handle(&first.buttons[2].custom_id, 1, None)
            .unwrap_err();
        assert_eq!(err.message(), INACTIVE);
    }
}
