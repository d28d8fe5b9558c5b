use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::clock::Clock;
use crate::config::Config;
use crate::gesture::{GestureSignal, GestureTracker, PointerEvent};
use crate::records::{Client, ClientId, ClientStore, NewClient};
use crate::swipe::{RowActions, RowSnapshot, SwipeList};
use crate::ui;

/// Edit/delete requests raised by rows, handled after the row has closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowRequest {
    Edit(ClientId),
    Delete(ClientId),
}

#[derive(Debug, Default)]
pub struct PendingRequests {
    requests: Vec<RowRequest>,
}

impl PendingRequests {
    pub fn drain(&mut self) -> Vec<RowRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl RowActions<ClientId> for PendingRequests {
    fn edit(&mut self, row: &RowSnapshot<ClientId>) {
        self.requests.push(RowRequest::Edit(row.id.clone()));
    }

    fn delete(&mut self, row: &RowSnapshot<ClientId>) {
        self.requests.push(RowRequest::Delete(row.id.clone()));
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Mode {
    #[default]
    Browse,
    /// Waiting for the user to confirm a delete
    ConfirmDelete { id: ClientId, name: String },
    /// Renaming a client
    EditName { id: ClientId, input: String },
    /// Filling in the new-client form
    AddClient { form: NewClient, field: FormField },
}

/// Field of the new-client form that receives typed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Name,
    Phone,
    Address,
}

impl FormField {
    pub const ALL: [FormField; 3] = [FormField::Name, FormField::Phone, FormField::Address];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Name",
            FormField::Phone => "Phone",
            FormField::Address => "Address",
        }
    }

    fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Phone,
            FormField::Phone => FormField::Address,
            FormField::Address => FormField::Name,
        }
    }

    fn previous(self) -> Self {
        match self {
            FormField::Name => FormField::Address,
            FormField::Phone => FormField::Name,
            FormField::Address => FormField::Phone,
        }
    }

    pub fn value(self, form: &NewClient) -> &str {
        match self {
            FormField::Name => &form.name,
            FormField::Phone => &form.phone,
            FormField::Address => &form.address,
        }
    }

    fn value_mut(self, form: &mut NewClient) -> &mut String {
        match self {
            FormField::Name => &mut form.name,
            FormField::Phone => &mut form.phone,
            FormField::Address => &mut form.address,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub config: Config,
    pub mode: Mode,
    pub selected: usize,
    pub scroll_offset: usize,
    pub status: Option<String>,
    pub viewport: Rect,
    store: Box<dyn ClientStore>,
    clients: Vec<Client>,
    list: SwipeList<ClientId, PendingRequests>,
    tracker: GestureTracker,
    active_row: Option<ClientId>,
}

impl App {
    pub fn new(config: Config, store: Box<dyn ClientStore>, clock: Arc<dyn Clock>) -> Result<App> {
        let list = SwipeList::new(config.swipe.clone(), clock, PendingRequests::default())?;
        let mut app = App {
            should_quit: false,
            config,
            mode: Mode::Browse,
            selected: 0,
            scroll_offset: 0,
            status: None,
            viewport: Rect::default(),
            store,
            clients: Vec::new(),
            list,
            tracker: GestureTracker::new(),
            active_row: None,
        };
        app.refresh()?;
        Ok(app)
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn list(&self) -> &SwipeList<ClientId, PendingRequests> {
        &self.list
    }

    pub fn selected_client(&self) -> Option<&Client> {
        self.clients.get(self.selected)
    }

    /// Number of terminal columns the action buttons take up
    pub fn action_columns(&self) -> u16 {
        (self.config.swipe.action_width / self.config.ui.column_width).ceil() as u16
    }

    /// Reload clients from the store and bring the rows in line
    pub fn refresh(&mut self) -> Result<()> {
        self.abandon_gesture();
        self.clients = self.store.list()?;
        self.list.sync(self.clients.iter().map(|c| c.id.clone()));
        if self.selected >= self.clients.len() {
            self.selected = self.clients.len().saturating_sub(1);
        }
        self.keep_selection_visible();
        Ok(())
    }

    /// Fire due timers and settle finished animations
    pub fn on_tick(&mut self) {
        let closed = self.list.tick();
        if closed > 0 {
            debug!(closed, "Idle rows closed");
        }
        self.list.settle_animations(self.config.ui.animation);
    }

    /// How long the event loop may block before the next tick is needed
    pub fn poll_timeout(&self) -> Duration {
        let tick = self.config.ui.tick_rate;
        match self.list.next_deadline() {
            Some(deadline) => deadline.saturating_sub(self.list.now()).min(tick),
            None => tick,
        }
    }

    pub fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key(key.code, key.modifiers)
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => {
                self.handle_resize(width, height);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) {
        self.viewport = Rect::new(0, 0, width, height);
        self.keep_selection_visible();
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            info!("Ctrl+C pressed, quitting");
            self.should_quit = true;
            return Ok(());
        }

        let result = match self.mode.clone() {
            Mode::Browse => self.handle_browse_key(key),
            Mode::ConfirmDelete { id, name } => self.handle_confirm_key(key, id, name),
            Mode::EditName { id, input } => {
                if let Some(text) = self.handle_input_key(key, input) {
                    self.rename_client(&id, text)?;
                }
                Ok(())
            }
            Mode::AddClient { form, field } => self.handle_form_key(key, form, field),
        };
        // A prompt took over mid-drag
        if self.mode != Mode::Browse {
            self.abandon_gesture();
        }
        result
    }

    fn handle_browse_key(&mut self, key: KeyCode) -> Result<()> {
        match key {
            KeyCode::Char('q') => {
                info!("Quit requested by user");
                self.should_quit = true;
            }
            KeyCode::Esc => {
                if self.list.close_open_row().is_none() {
                    info!("Escape pressed, quitting");
                    self.should_quit = true;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                self.keep_selection_visible();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.clients.len() {
                    self.selected += 1;
                }
                self.keep_selection_visible();
            }
            KeyCode::Left | KeyCode::Char('h') => {
                // Keyboard stand-in for a full swipe
                if let Some(id) = self.selected_id() {
                    let width = self.config.swipe.action_width;
                    self.list.gesture_start(&id);
                    self.list.gesture_move(&id, -width);
                    self.list.gesture_end(&id, -width);
                }
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('x') => {
                if let Some(id) = self.selected_id() {
                    self.list.close(&id);
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_id() {
                    self.list.trigger_edit(&id);
                    self.process_requests()?;
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    self.list.trigger_delete(&id);
                    self.process_requests()?;
                }
            }
            KeyCode::Char('a') => {
                self.list.close_open_row();
                self.mode = Mode::AddClient {
                    form: NewClient::default(),
                    field: FormField::Name,
                };
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_confirm_key(&mut self, key: KeyCode, id: ClientId, name: String) -> Result<()> {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.mode = Mode::Browse;
                self.delete_client(&id, &name)?;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.status = Some(format!("Kept {}", name));
            }
            _ => {}
        }
        Ok(())
    }

    /// Edit the text of an input mode. Returns the text once submitted.
    fn handle_input_key(&mut self, key: KeyCode, mut input: String) -> Option<String> {
        match key {
            KeyCode::Char(c) => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                return Some(input);
            }
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                return None;
            }
            _ => {}
        }
        if let Mode::EditName { input: text, .. } = &mut self.mode {
            *text = input;
        }
        None
    }

    fn handle_form_key(
        &mut self,
        key: KeyCode,
        mut form: NewClient,
        mut field: FormField,
    ) -> Result<()> {
        match key {
            KeyCode::Char(c) => field.value_mut(&mut form).push(c),
            KeyCode::Backspace => {
                field.value_mut(&mut form).pop();
            }
            KeyCode::Tab | KeyCode::Down => field = field.next(),
            KeyCode::BackTab | KeyCode::Up => field = field.previous(),
            KeyCode::Enter => {
                self.mode = Mode::Browse;
                return self.add_client(form);
            }
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                return Ok(());
            }
            _ => {}
        }
        self.mode = Mode::AddClient { form, field };
        Ok(())
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        if self.mode != Mode::Browse {
            self.abandon_gesture();
            return Ok(());
        }
        let column_width = self.config.ui.column_width;
        // Terminal cells are roughly twice as tall as they are wide
        let x = mouse.column as f32 * column_width;
        let y = mouse.row as f32 * column_width * 2.0;

        let pointer = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let list_area = ui::list_area(self.viewport);
                let Some(index) = ui::row_at(list_area, self.scroll_offset, mouse.column, mouse.row)
                    .filter(|i| *i < self.clients.len())
                else {
                    self.abandon_gesture();
                    return Ok(());
                };
                self.abandon_gesture();
                self.selected = index;
                self.active_row = Some(self.clients[index].id.clone());
                PointerEvent::Down { x, y }
            }
            MouseEventKind::Drag(MouseButton::Left) => PointerEvent::Drag { x, y },
            MouseEventKind::Up(MouseButton::Left) => PointerEvent::Up { x, y },
            _ => return Ok(()),
        };

        let Some(id) = self.active_row.clone() else {
            return Ok(());
        };
        match self.tracker.handle(pointer) {
            Some(GestureSignal::Start) => self.list.gesture_start(&id),
            Some(GestureSignal::Move { delta_x }) => self.list.gesture_move(&id, delta_x),
            Some(GestureSignal::End { delta_x }) => {
                self.list.gesture_end(&id, delta_x);
            }
            Some(GestureSignal::Tap { .. }) => {
                self.list.gesture_cancel(&id);
                self.handle_tap(&id, mouse.column)?;
            }
            None => {}
        }
        if matches!(pointer, PointerEvent::Up { .. }) {
            self.active_row = None;
        }
        Ok(())
    }

    /// Drop any half-finished pointer gesture, settling its row
    fn abandon_gesture(&mut self) {
        self.tracker.reset();
        if let Some(id) = self.active_row.take() {
            self.list.gesture_cancel(&id);
        }
    }

    fn handle_tap(&mut self, id: &ClientId, column: u16) -> Result<()> {
        let open = self.list.row(id).is_some_and(|row| row.is_open());
        if !open {
            return Ok(());
        }
        let list_area = ui::list_area(self.viewport);
        let action_columns = self.action_columns().min(list_area.width);
        let actions_start = list_area.right().saturating_sub(action_columns);
        if column < actions_start {
            // Tap on the content of an open row just closes it
            self.list.close(id);
            return Ok(());
        }
        let actions = Rect::new(actions_start, list_area.y, action_columns, 1);
        let (edit, _) = ui::action_buttons(actions);
        if column < edit.right() {
            self.list.trigger_edit(id);
        } else {
            self.list.trigger_delete(id);
        }
        self.process_requests()
    }

    /// Act on edit/delete requests raised by rows
    fn process_requests(&mut self) -> Result<()> {
        for request in self.list.actions_mut().drain() {
            match request {
                RowRequest::Edit(id) => {
                    if let Some(client) = self.clients.iter().find(|c| c.id == id) {
                        self.mode = Mode::EditName {
                            id,
                            input: client.name.clone(),
                        };
                    }
                }
                RowRequest::Delete(id) => {
                    let Some(name) = self
                        .clients
                        .iter()
                        .find(|c| c.id == id)
                        .map(|c| c.name.clone())
                    else {
                        continue;
                    };
                    if self.config.ui.confirm_delete {
                        self.mode = Mode::ConfirmDelete { id, name };
                    } else {
                        self.delete_client(&id, &name)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn delete_client(&mut self, id: &ClientId, name: &str) -> Result<()> {
        match self.store.delete(id) {
            Ok(()) => {
                info!(client = %id, "Deleted client");
                self.status = Some(format!("[+] Deleted {}", name));
            }
            Err(err) => {
                error!(client = %id, "Failed to delete client: {}", err);
                self.status = Some(format!("[x] Failed to delete {}: {}", name, err));
            }
        }
        self.refresh()
    }

    fn rename_client(&mut self, id: &ClientId, name: String) -> Result<()> {
        let Some(mut client) = self.clients.iter().find(|c| &c.id == id).cloned() else {
            return Ok(());
        };
        client.name = name.trim().to_string();
        match self.store.update(client) {
            Ok(()) => {
                info!(client = %id, "Updated client");
                self.status = Some(format!("[+] Renamed to {}", name.trim()));
            }
            Err(err) => {
                error!(client = %id, "Failed to update client: {}", err);
                self.status = Some(format!("[x] Failed to update client: {}", err));
            }
        }
        self.refresh()
    }

    fn add_client(&mut self, form: NewClient) -> Result<()> {
        match self.store.add(form) {
            Ok(client) => {
                info!(client = %client.id, "Added client");
                self.status = Some(format!("[+] Added {}", client.name));
                self.selected = 0;
            }
            Err(err) => {
                error!("Failed to add client: {}", err);
                self.status = Some(format!("[x] Failed to add client: {}", err));
            }
        }
        self.refresh()
    }

    fn selected_id(&self) -> Option<ClientId> {
        self.selected_client().map(|c| c.id.clone())
    }

    fn keep_selection_visible(&mut self) {
        let visible = ui::visible_rows(ui::list_area(self.viewport)).max(1);
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible {
            self.scroll_offset = self.selected + 1 - visible;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::records::MemoryClientStore;
    use crate::swipe::RowPhase;

    fn app() -> (App, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let mut app = App::new(
            Config::default(),
            Box::new(MemoryClientStore::with_samples()),
            clock.clone(),
        )
        .unwrap();
        app.handle_resize(80, 30);
        (app, clock)
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE).unwrap();
    }

    #[test]
    fn test_app_new_loads_clients() {
        let (app, _) = app();
        assert!(!app.should_quit);
        assert_eq!(app.clients().len(), 4);
        assert_eq!(app.list().len(), 4);
        assert_eq!(app.mode, Mode::Browse);
    }

    #[test]
    fn test_selection_bounds() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected, 0);
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.selected, 3);
    }

    #[test]
    fn test_escape_closes_open_row_before_quitting() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Left);
        assert!(app.list().open_row().is_some());

        press(&mut app, KeyCode::Esc);
        assert!(!app.should_quit);
        assert!(app.list().open_row().is_none());

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    fn mouse(app: &mut App, kind: MouseEventKind, column: u16, row: u16) {
        app.handle_mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
        .unwrap();
    }

    #[test]
    fn test_prompt_mid_drag_settles_the_row() {
        let (mut app, _) = app();
        let id = ClientId::from("c1");
        mouse(&mut app, MouseEventKind::Down(MouseButton::Left), 60, 4);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), 57, 4);
        assert_eq!(app.list().row(&id).unwrap().phase(), RowPhase::Dragging);

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.list().row(&id).unwrap().phase(), RowPhase::Closed);

        // The release lands after the prompt is gone and must not resume the drag
        press(&mut app, KeyCode::Esc);
        mouse(&mut app, MouseEventKind::Drag(MouseButton::Left), 40, 4);
        mouse(&mut app, MouseEventKind::Up(MouseButton::Left), 40, 4);
        assert_eq!(app.list().row(&id).unwrap().phase(), RowPhase::Closed);
        assert_eq!(app.list().row(&id).unwrap().offset(), 0.0);
    }

    #[test]
    fn test_x_closes_selected_row() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('h'));
        let id = ClientId::from("c1");
        assert_eq!(app.list().row(&id).unwrap().phase(), RowPhase::Open);

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.list().row(&id).unwrap().phase(), RowPhase::Closed);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_delete_waits_for_confirmation() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Char('d'));

        let id = ClientId::from("c1");
        assert_eq!(
            app.mode,
            Mode::ConfirmDelete {
                id: id.clone(),
                name: "John Doe".to_string()
            }
        );
        assert_eq!(app.list().row(&id).unwrap().phase(), RowPhase::Closed);
        assert_eq!(app.clients().len(), 4);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.clients().len(), 4);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.clients().len(), 3);
        assert!(!app.list().contains(&id));
        assert_eq!(app.status.as_deref(), Some("[+] Deleted John Doe"));
    }

    #[test]
    fn test_edit_renames_client() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));
        assert!(matches!(app.mode, Mode::EditName { .. }));

        for _ in 0.."Alice Smith".len() {
            press(&mut app, KeyCode::Backspace);
        }
        for c in "Alicia".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.clients()[1].name, "Alicia");
    }

    #[test]
    fn test_failed_update_is_reported() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('e'));
        for _ in 0.."John Doe".len() {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);

        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("[x]")));
        assert_eq!(app.clients()[0].name, "John Doe");
    }

    #[test]
    fn test_add_client() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('a'));
        for c in "Dana".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.clients().len(), 5);
        assert_eq!(app.clients()[0].name, "Dana");
        assert_eq!(app.list().ids()[0], app.clients()[0].id);
    }

    #[test]
    fn test_add_client_with_phone_and_address() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('a'));
        let type_text = |app: &mut App, text: &str| {
            for c in text.chars() {
                press(app, KeyCode::Char(c));
            }
        };
        type_text(&mut app, "Dana");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "555-0100");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "9 Elm St");
        assert_eq!(
            app.mode,
            Mode::AddClient {
                form: NewClient {
                    name: "Dana".to_string(),
                    phone: "555-0100".to_string(),
                    address: "9 Elm St".to_string(),
                },
                field: FormField::Address,
            }
        );

        // Back to the phone field to fix a typo
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.mode, Mode::Browse);
        let dana = &app.clients()[0];
        assert_eq!(dana.name, "Dana");
        assert_eq!(dana.phone, "555-0101");
        assert_eq!(dana.address, "9 Elm St");
        assert_eq!(dana.subtitle(), "555-0101 • 9 Elm St");
    }

    #[test]
    fn test_blank_new_client_is_reported() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('5'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.clients().len(), 4);
        assert!(app.status.as_deref().is_some_and(|s| s.starts_with("[x]")));
    }

    #[test]
    fn test_poll_timeout_tracks_next_deadline() {
        let (mut app, clock) = app();
        assert_eq!(app.poll_timeout(), app.config.ui.tick_rate);

        press(&mut app, KeyCode::Left);
        clock.advance(Duration::from_millis(4_990));
        assert_eq!(app.poll_timeout(), Duration::from_millis(10));

        clock.advance(Duration::from_millis(10));
        app.on_tick();
        assert!(app.list().open_row().is_none());
    }
}
