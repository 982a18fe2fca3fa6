use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::form::{self, ItemForm, SaveRequest, SubmitBlocked, SubmitMode};
use crate::item::{Item, ItemType};
use crate::nav::{Navigator, Route, Router};
use crate::notify::{Level, StatusLine};
use crate::store::{ItemService, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    ConfirmDiscard, // Leaving a form with unsaved changes
}

/// Result of a save task, delivered back to the UI loop
type SaveOutcome = (SaveRequest, Result<Item, StoreError>);

pub struct App {
    pub router: Router,
    pub popup: Popup,

    // Inventory list
    pub items: Vec<Item>,
    pub selected_item: usize,

    // Form for the current NewItem/EditItem route
    pub form: Option<ItemForm>,
    synced_generation: u64,

    pub status: StatusLine,
    pub config: AppConfig,
    pub should_quit: bool,

    service: Arc<dyn ItemService>,
    save_tx: mpsc::UnboundedSender<SaveOutcome>,
    save_rx: mpsc::UnboundedReceiver<SaveOutcome>,
}

impl App {
    pub async fn new(config: AppConfig, service: Arc<dyn ItemService>) -> Result<Self> {
        let (save_tx, save_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            router: Router::default(),
            popup: Popup::None,

            items: Vec::new(),
            selected_item: 0,

            form: None,
            synced_generation: 0,

            status: StatusLine::new(config.notifications),
            config,
            should_quit: false,

            service,
            save_tx,
            save_rx,
        };

        app.reload_items().await;
        Ok(app)
    }

    /// Jump straight to a screen (used for `--new` / `--edit`)
    pub fn open(&mut self, route: Route) {
        self.router.go_to(route);
        self.sync_screen();
    }

    pub fn selected(&self) -> Option<&Item> {
        self.items.get(self.selected_item)
    }

    pub fn low_stock_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_low_stock()).count()
    }

    /// Rebuild the form when the route changed since the last sync
    fn sync_screen(&mut self) {
        if self.router.generation() == self.synced_generation {
            return;
        }
        self.synced_generation = self.router.generation();

        match self.router.current() {
            Route::Inventory => self.form = None,
            Route::NewItem(item_type) => {
                self.form = Some(ItemForm::new(None, &self.config.defaults).with_item_type(item_type));
            }
            Route::EditItem(id) => match self.items.iter().find(|i| i.id == id).cloned() {
                Some(item) => self.form = Some(ItemForm::new(Some(&item), &self.config.defaults)),
                None => {
                    tracing::warn!("Tried to edit unknown item {}", id);
                    self.status.show(format!("Item not found: {}", id), Level::Error);
                    self.router.go_back();
                    self.sync_screen();
                }
            },
        }
    }

    async fn reload_items(&mut self) {
        match self.service.list_items().await {
            Ok(items) => {
                self.items = items;
                if self.selected_item >= self.items.len() {
                    self.selected_item = self.items.len().saturating_sub(1);
                }
            }
            Err(e) => {
                tracing::error!("Failed to load items: {}", e);
                self.status.show(format!("Failed to load items: {}", e), Level::Error);
            }
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        // Handle popups first
        if self.popup != Popup::None {
            self.handle_popup_key(key);
        } else if self.form.is_some() {
            self.handle_form_key(key);
        } else {
            self.handle_list_key(key).await;
        }

        self.sync_screen();
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        match self.popup {
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
            }
            Popup::ConfirmDiscard => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.popup = Popup::None;
                    self.router.go_back();
                }
                KeyCode::Char('n') | KeyCode::Esc => self.popup = Popup::None,
                _ => {}
            },
            Popup::None => {}
        }
    }

    async fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('j') | KeyCode::Down => {
                if !self.items.is_empty() {
                    self.selected_item = (self.selected_item + 1) % self.items.len();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if !self.items.is_empty() {
                    self.selected_item = self
                        .selected_item
                        .checked_sub(1)
                        .unwrap_or(self.items.len() - 1);
                }
            }

            KeyCode::Char('n') => self.router.go_to(Route::NewItem(ItemType::Product)),
            KeyCode::Char('s') => self.router.go_to(Route::NewItem(ItemType::Service)),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(id) = self.selected().map(|i| i.id) {
                    self.router.go_to(Route::EditItem(id));
                }
            }

            KeyCode::Char('R') => {
                self.reload_items().await;
                self.status.show(format!("{} items loaded", self.items.len()), Level::Info);
            }

            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::F(2) => return self.submit_form(SubmitMode::Save),
            KeyCode::Char('s') if ctrl => return self.submit_form(SubmitMode::Save),
            KeyCode::F(3) => return self.submit_form(SubmitMode::SaveAndNew),
            KeyCode::Char('n') if ctrl => return self.submit_form(SubmitMode::SaveAndNew),
            KeyCode::F(1) => {
                self.popup = Popup::Help;
                return;
            }
            _ => {}
        }

        let Some(form) = self.form.as_mut() else {
            return;
        };

        // Input is frozen while the save is in flight
        if form.is_submitting() {
            if key.code == KeyCode::Esc {
                self.status.show("Saving, please wait...", Level::Info);
            }
            return;
        }

        let on_selector = form.focused_field().is_selector();
        match key.code {
            KeyCode::Esc => {
                if form.is_dirty() {
                    self.popup = Popup::ConfirmDiscard;
                } else {
                    self.router.go_back();
                }
            }

            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::PageDown => form.next_tab(),
            KeyCode::PageUp => form.prev_tab(),
            KeyCode::Right if ctrl => form.next_tab(),
            KeyCode::Left if ctrl => form.prev_tab(),

            KeyCode::Left | KeyCode::Right if on_selector => form.cycle_selection(),
            KeyCode::Char(' ') if on_selector => form.cycle_selection(),
            KeyCode::Enter => {
                if on_selector {
                    form.cycle_selection();
                } else {
                    form.focus_next();
                }
            }

            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) if !ctrl => form.input_char(c),
            _ => {}
        }
    }

    /// Validate the form and hand the save to a background task
    fn submit_form(&mut self, mode: SubmitMode) {
        let Some(form) = self.form.as_mut() else {
            return;
        };

        match form.begin_submit(mode) {
            Ok(request) => {
                self.status.show("Saving...", Level::Info);

                let service = Arc::clone(&self.service);
                let tx = self.save_tx.clone();
                tokio::spawn(async move {
                    let result = form::save(&*service, &request).await;
                    if tx.send((request, result)).is_err() {
                        tracing::warn!("Save finished after the app shut down");
                    }
                });
            }
            Err(SubmitBlocked::InFlight) => {
                self.status.show("Still saving...", Level::Info);
            }
            Err(SubmitBlocked::Invalid(errors)) => {
                self.status.show(errors.to_string(), Level::Error);
            }
        }
    }

    pub async fn tick(&mut self) -> Result<()> {
        // Deliver finished saves to the form that started them
        while let Ok((request, result)) = self.save_rx.try_recv() {
            match self.form.as_mut() {
                Some(form) => form.finish_submit(&request, result, &mut self.router, &mut self.status),
                None => tracing::warn!("Dropping save result, form already closed"),
            }
        }

        self.sync_screen();

        if self.router.take_refresh() {
            self.reload_items().await;
        }

        // Clear status message after timeout
        self.status.expire();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Field;
    use crate::store::JsonStore;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await.unwrap();
        }
    }

    async fn test_app(dir: &tempfile::TempDir) -> App {
        let store = JsonStore::new(dir.path().join("items.json"));
        App::new(AppConfig::default(), Arc::new(store)).await.unwrap()
    }

    /// Tick until the background save has been applied
    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.tick().await.unwrap();
            if !app.form.as_ref().map(|f| f.is_submitting()).unwrap_or(false) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("save did not finish");
    }

    #[tokio::test]
    async fn test_create_item_returns_to_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.router.current(), Route::NewItem(ItemType::Product));
        assert_eq!(app.form.as_ref().unwrap().focused_field(), Field::Name);

        type_str(&mut app, "Quinoa 1kg").await;
        app.handle_key(key(KeyCode::PageDown)).await.unwrap();
        type_str(&mut app, "410").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        assert!(app.form.as_ref().unwrap().is_submitting());

        settle(&mut app).await;

        assert_eq!(app.router.current(), Route::Inventory);
        assert!(app.form.is_none());
        assert_eq!(app.items.len(), 1);
        assert_eq!(app.items[0].name, "Quinoa 1kg");
        assert_eq!(app.status.message.as_ref().unwrap().level, Level::Success);
    }

    #[tokio::test]
    async fn test_invalid_form_stays_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key(key(KeyCode::Char('s'))).await.unwrap();
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        app.tick().await.unwrap();

        let form = app.form.as_ref().unwrap();
        assert!(!form.is_submitting());
        assert!(form.errors().contains(Field::Name));
        assert_eq!(app.status.message.as_ref().unwrap().level, Level::Error);
        assert!(app.items.is_empty());
    }

    #[tokio::test]
    async fn test_save_and_new_keeps_form_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key(key(KeyCode::Char('s'))).await.unwrap();
        type_str(&mut app, "Gift Wrapping").await;
        app.handle_key(key(KeyCode::PageDown)).await.unwrap();
        type_str(&mut app, "25").await;
        app.handle_key(key(KeyCode::F(3))).await.unwrap();
        settle(&mut app).await;

        let form = app.form.as_ref().unwrap();
        assert_eq!(app.router.current(), Route::NewItem(ItemType::Service));
        assert_eq!(form.item_type(), ItemType::Service);
        assert!(form.draft().name.is_empty());
        assert_eq!(app.items.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_existing_item() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
        type_str(&mut app, "Ink").await;
        app.handle_key(key(KeyCode::PageDown)).await.unwrap();
        type_str(&mut app, "15").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Enter)).await.unwrap();
        let id = app.items[0].id;
        assert_eq!(app.router.current(), Route::EditItem(id));
        assert_eq!(app.form.as_ref().unwrap().draft().name, "Ink");

        type_str(&mut app, " Blue").await;
        app.handle_key(key(KeyCode::F(2))).await.unwrap();
        settle(&mut app).await;

        assert_eq!(app.router.current(), Route::Inventory);
        assert_eq!(app.items[0].name, "Ink Blue");
        assert_eq!(app.items[0].id, id);
    }

    #[tokio::test]
    async fn test_escape_with_changes_asks_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
        type_str(&mut app, "q").await;
        assert!(!app.should_quit);
        assert_eq!(app.form.as_ref().unwrap().draft().name, "q");

        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.popup, Popup::ConfirmDiscard);

        app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.popup, Popup::None);
        assert!(app.form.is_some());

        app.handle_key(key(KeyCode::Esc)).await.unwrap();
        app.handle_key(key(KeyCode::Char('y'))).await.unwrap();
        assert_eq!(app.router.current(), Route::Inventory);
        assert!(app.form.is_none());
    }

    #[tokio::test]
    async fn test_edit_unknown_item_falls_back_to_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.open(Route::EditItem(uuid::Uuid::new_v4()));
        assert_eq!(app.router.current(), Route::Inventory);
        assert!(app.form.is_none());
        assert_eq!(app.status.message.as_ref().unwrap().level, Level::Error);
    }

    #[tokio::test]
    async fn test_selector_cycles_with_space() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(&dir).await;

        app.handle_key(key(KeyCode::Char('n'))).await.unwrap();
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.form.as_ref().unwrap().focused_field(), Field::ItemType);

        app.handle_key(key(KeyCode::Char(' '))).await.unwrap();
        let form = app.form.as_ref().unwrap();
        assert_eq!(form.item_type(), ItemType::Service);
        assert_eq!(form.visible_tabs().len(), 2);
    }
}
