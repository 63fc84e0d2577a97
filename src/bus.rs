//! In-process observer store shared by the pages and the console.
//!
//! Pages publish toasts and navigation requests; whoever renders them holds
//! a [`Subscription`] and drains it once per frame. Not `Send`: everything
//! runs on the console's event loop thread.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::review::ReviewId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Reviews,
    ReviewDetail(ReviewId),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Reviews => "/reviews".to_string(),
            Route::ReviewDetail(id) => format!("/reviews/{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Notice(Notice),
    Navigate(Route),
}

type Queue = RefCell<VecDeque<AppEvent>>;

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Rc<RefCell<Vec<Weak<Queue>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let queue = Rc::new(RefCell::new(VecDeque::new()));
        self.subscribers.borrow_mut().push(Rc::downgrade(&queue));
        Subscription { queue }
    }

    pub fn publish(&self, event: AppEvent) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|weak| match weak.upgrade() {
            Some(queue) => {
                queue.borrow_mut().push_back(event.clone());
                true
            }
            None => false,
        });
    }

    pub fn notify(&self, notice: Notice) {
        self.publish(AppEvent::Notice(notice));
    }

    pub fn navigate(&self, route: Route) {
        self.publish(AppEvent::Navigate(route));
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

pub struct Subscription {
    queue: Rc<Queue>,
}

impl Subscription {
    pub fn drain(&self) -> Vec<AppEvent> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}
