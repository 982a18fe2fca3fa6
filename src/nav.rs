use crate::item::{ItemId, ItemType};

/// Screens the app can navigate to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Inventory,
    NewItem(ItemType),
    EditItem(ItemId),
}

/// Navigation capability handed to the item form
pub trait Navigator {
    fn go_back(&mut self);
    fn go_to(&mut self, route: Route);
    fn refresh_current_view(&mut self);
}

/// Screen stack. The inventory list is always at the bottom.
#[derive(Debug)]
pub struct Router {
    stack: Vec<Route>,
    generation: u64,
    refresh_requested: bool,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            stack: vec![Route::Inventory],
            generation: 0,
            refresh_requested: false,
        }
    }
}

impl Router {
    pub fn current(&self) -> Route {
        self.stack.last().copied().unwrap_or(Route::Inventory)
    }

    /// Bumped on every route change, so the app knows when to rebuild its screen
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }
}

impl Navigator for Router {
    fn go_back(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
            self.generation += 1;
        }
    }

    fn go_to(&mut self, route: Route) {
        match route {
            Route::Inventory => self.stack.truncate(1),
            _ => self.stack.push(route),
        }
        self.generation += 1;
    }

    fn refresh_current_view(&mut self) {
        self.refresh_requested = true;
    }
}


#[cfg(test)]
pub mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NavEvent {
        Back,
        To(Route),
        Refresh,
    }

    /// Navigator that records every call
    #[derive(Debug, Default)]
    pub struct RecordingNavigator {
        pub events: Vec<NavEvent>,
    }

    impl Navigator for RecordingNavigator {
        fn go_back(&mut self) {
            self.events.push(NavEvent::Back);
        }

        fn go_to(&mut self, route: Route) {
            self.events.push(NavEvent::To(route));
        }

        fn refresh_current_view(&mut self) {
            self.events.push(NavEvent::Refresh);
        }
    }
}
