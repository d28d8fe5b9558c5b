//! Client records and the stores that hold them.
//!
//! The swipe list only ever sees [`ClientId`]s. Edits and deletes requested
//! from a row end up here, after which the list is re-synced.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, SwipeError};

/// Stable identifier of a client record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

impl Client {
    /// Second line shown under the name
    pub fn subtitle(&self) -> String {
        let phone = if self.phone.trim().is_empty() {
            "No phone"
        } else {
            self.phone.as_str()
        };
        let address = if self.address.trim().is_empty() {
            "No address"
        } else {
            self.address.as_str()
        };
        format!("{} • {}", phone, address)
    }
}

/// Fields supplied when creating a client
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewClient {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Source of client records
pub trait ClientStore {
    fn list(&self) -> Result<Vec<Client>>;
    fn add(&mut self, client: NewClient) -> Result<Client>;
    fn update(&mut self, client: Client) -> Result<()>;
    fn delete(&mut self, id: &ClientId) -> Result<()>;
}

/// In-memory store, newest client first
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    clients: Vec<Client>,
}

impl MemoryClientStore {
    pub fn new(clients: Vec<Client>) -> Self {
        Self { clients }
    }

    pub fn with_samples() -> Self {
        Self::new(sample_clients())
    }
}

impl ClientStore for MemoryClientStore {
    fn list(&self) -> Result<Vec<Client>> {
        Ok(self.clients.clone())
    }

    fn add(&mut self, client: NewClient) -> Result<Client> {
        insert_client(&mut self.clients, client)
    }

    fn update(&mut self, client: Client) -> Result<()> {
        update_client(&mut self.clients, client)
    }

    fn delete(&mut self, id: &ClientId) -> Result<()> {
        delete_client(&mut self.clients, id)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClientFile {
    #[serde(default)]
    clients: Vec<Client>,
}

/// Store backed by a TOML file with a `[[clients]]` array.
///
/// The file is read once on open and rewritten after every change.
#[derive(Debug)]
pub struct TomlClientStore {
    path: PathBuf,
    clients: Vec<Client>,
}

impl TomlClientStore {
    /// Open `path`, starting empty if it does not exist yet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let clients = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let file: ClientFile = toml::from_str(&contents)?;
            check_unique_ids(&file.clients)?;
            file.clients
        } else {
            Vec::new()
        };
        info!(path = %path.display(), clients = clients.len(), "Opened client file");
        Ok(Self { path, clients })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `clients` to disk, replacing the in-memory list only once the
    /// write has succeeded
    fn commit(&mut self, clients: Vec<Client>) -> Result<()> {
        let file = ClientFile { clients };
        let contents = toml::to_string_pretty(&file)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, contents)?;
        self.clients = file.clients;
        Ok(())
    }
}

impl ClientStore for TomlClientStore {
    fn list(&self) -> Result<Vec<Client>> {
        Ok(self.clients.clone())
    }

    fn add(&mut self, client: NewClient) -> Result<Client> {
        let mut clients = self.clients.clone();
        let created = insert_client(&mut clients, client)?;
        self.commit(clients)?;
        Ok(created)
    }

    fn update(&mut self, client: Client) -> Result<()> {
        let mut clients = self.clients.clone();
        update_client(&mut clients, client)?;
        self.commit(clients)
    }

    fn delete(&mut self, id: &ClientId) -> Result<()> {
        let mut clients = self.clients.clone();
        delete_client(&mut clients, id)?;
        self.commit(clients)
    }
}

fn insert_client(clients: &mut Vec<Client>, new: NewClient) -> Result<Client> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(SwipeError::EmptyClientName);
    }
    let client = Client {
        id: next_client_id(clients),
        name: name.to_string(),
        phone: new.phone.trim().to_string(),
        address: new.address.trim().to_string(),
        notes: String::new(),
    };
    clients.insert(0, client.clone());
    Ok(client)
}

fn update_client(clients: &mut [Client], client: Client) -> Result<()> {
    if client.name.trim().is_empty() {
        return Err(SwipeError::EmptyClientName);
    }
    let slot = clients
        .iter_mut()
        .find(|c| c.id == client.id)
        .ok_or_else(|| SwipeError::ClientNotFound {
            id: client.id.to_string(),
        })?;
    *slot = client;
    Ok(())
}

fn delete_client(clients: &mut Vec<Client>, id: &ClientId) -> Result<()> {
    let before = clients.len();
    clients.retain(|c| &c.id != id);
    if clients.len() == before {
        return Err(SwipeError::ClientNotFound { id: id.to_string() });
    }
    Ok(())
}

fn check_unique_ids(clients: &[Client]) -> Result<()> {
    let mut seen = HashSet::new();
    for client in clients {
        if !seen.insert(&client.id) {
            return Err(SwipeError::DuplicateClient {
                id: client.id.to_string(),
            });
        }
    }
    Ok(())
}

fn next_client_id(clients: &[Client]) -> ClientId {
    let mut n = clients.len() + 1;
    loop {
        let candidate = ClientId(format!("c{}", n));
        if !clients.iter().any(|c| c.id == candidate) {
            return candidate;
        }
        n += 1;
    }
}

pub fn sample_clients() -> Vec<Client> {
    let client = |id: &str, name: &str, phone: &str, address: &str| Client {
        id: ClientId::from(id),
        name: name.to_string(),
        phone: phone.to_string(),
        address: address.to_string(),
        notes: String::new(),
    };
    vec![
        client("c1", "John Doe", "555-0142", "12 Harbor Rd"),
        client("c2", "Alice Smith", "555-0187", ""),
        client("c3", "Bob Johnson", "", "48 Mill Lane"),
        client("c4", "Emma Brown", "555-0110", "7 Orchard Way"),
    ]
}
