//! The client registry.
//!
//! Insertion order is panel order. Removal shifts later entries down so
//! iteration never sees holes. Stacking order is tracked separately since
//! raise/lower must not reorder the panel.

use indexmap::IndexMap;
use thiserror::Error;

use crate::client::{Client, ClientId, WindowHandle};
use crate::state::Geometry;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Client registry is full ({0} clients)")]
    Capacity(usize),
    #[error("Window {0} is already managed")]
    AlreadyManaged(WindowHandle),
}

#[derive(Debug, Clone)]
pub struct ClientRegistry {
    clients: IndexMap<ClientId, Client>,
    /// Bottom to top.
    stacking: Vec<ClientId>,
    capacity: usize,
    next_id: u64,
}

impl ClientRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            clients: IndexMap::new(),
            stacking: Vec::new(),
            capacity,
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a new client on top of the stack.
    pub fn insert(
        &mut self,
        window: WindowHandle,
        frame: WindowHandle,
        geometry: Geometry,
        title: String,
    ) -> Result<ClientId, RegistryError> {
        if self.find_by_window(window).is_some() {
            return Err(RegistryError::AlreadyManaged(window));
        }
        if self.clients.len() >= self.capacity {
            return Err(RegistryError::Capacity(self.capacity));
        }

        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.clients
            .insert(id, Client::new(id, window, frame, geometry, title));
        self.stacking.push(id);
        Ok(id)
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let client = self.clients.shift_remove(&id)?;
        self.stacking.retain(|&s| s != id);
        Some(client)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.get_mut(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Look up by application window handle.
    pub fn find_by_window(&self, window: WindowHandle) -> Option<ClientId> {
        self.clients
            .values()
            .find(|c| c.window == window)
            .map(|c| c.id)
    }

    /// Look up by frame handle.
    pub fn find_by_frame(&self, frame: WindowHandle) -> Option<ClientId> {
        self.clients
            .values()
            .find(|c| c.frame == frame)
            .map(|c| c.id)
    }

    /// Clients in panel order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Client> {
        self.clients.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Client> {
        self.clients.values_mut()
    }

    /// The most recently registered client.
    pub fn last(&self) -> Option<ClientId> {
        self.clients.keys().next_back().copied()
    }

    /// Stacking order, bottom to top.
    pub fn stacking(&self) -> &[ClientId] {
        &self.stacking
    }

    pub fn raise(&mut self, id: ClientId) {
        if let Some(pos) = self.stacking.iter().position(|&s| s == id) {
            let id = self.stacking.remove(pos);
            self.stacking.push(id);
        }
    }

    pub fn lower(&mut self, id: ClientId) {
        if let Some(pos) = self.stacking.iter().position(|&s| s == id) {
            let id = self.stacking.remove(pos);
            self.stacking.insert(0, id);
        }
    }

    /// Topmost mapped frame containing a root-relative point.
    pub fn topmost_at(&self, x: i32, y: i32) -> Option<ClientId> {
        self.stacking.iter().rev().copied().find(|id| {
            self.clients
                .get(id)
                .is_some_and(|c| c.is_mapped() && c.geometry.contains(x, y))
        })
    }

    /// Make `id` the only active client.
    pub fn activate(&mut self, id: ClientId) {
        for client in self.clients.values_mut() {
            client.set_active(client.id == id);
        }
    }
}
