//! Collections of duties
//!
//! A [`Collection`] is a cheap handle to a shared registry. Duties added to it
//! keep a weak reference back, so they can resolve pre and post duties by name.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::{find_duties_file, parse_duties_file, DUTIES_FILE_NAMES};
use crate::error::{DutyError, Result};
use crate::runner::{duties_from_file, Duty};
use crate::validation::ParamKind;

/// Duties and aliases of one collection, in registration order
#[derive(Debug, Default)]
pub struct Registry {
    path: PathBuf,
    duties: Vec<Duty>,
    /// alias -> duty name
    aliases: Vec<(String, String)>,
}

impl Registry {
    fn duty(&self, name: &str) -> Option<&Duty> {
        self.duties.iter().find(|d| d.name() == name)
    }

    fn alias_target(&self, alias: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, name)| name.as_str())
    }
}

/// A set of duties, usually loaded from a duties file
#[derive(Debug, Clone)]
pub struct Collection {
    registry: Rc<RefCell<Registry>>,
}

impl Default for Collection {
    fn default() -> Self {
        Collection::new(DUTIES_FILE_NAMES[0])
    }
}

impl Collection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Collection {
            registry: Rc::new(RefCell::new(Registry {
                path: path.into(),
                ..Registry::default()
            })),
        }
    }

    pub(crate) fn from_registry(registry: Rc<RefCell<Registry>>) -> Self {
        Collection { registry }
    }

    /// Path of the duties file this collection loads by default.
    pub fn path(&self) -> PathBuf {
        self.registry.borrow().path.clone()
    }

    /// Whether both handles point to the same collection.
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }

    /// Register a duty and its aliases.
    ///
    /// The collection gets its own registration of the duty, so the same
    /// duty can be added to several collections. A duty with the same name
    /// replaces the previous one. Returns the registered duty.
    pub fn add(&self, duty: Duty) -> Duty {
        let registered = duty.attach(&self.registry);
        let mut registry = self.registry.borrow_mut();

        for alias in registered.aliases() {
            match registry.aliases.iter_mut().find(|(a, _)| a == alias) {
                Some(entry) => entry.1 = registered.name().to_string(),
                None => registry
                    .aliases
                    .push((alias.clone(), registered.name().to_string())),
            }
        }

        match registry.duties.iter_mut().find(|d| d.name() == registered.name()) {
            Some(slot) => *slot = registered.clone(),
            None => registry.duties.push(registered.clone()),
        }

        log::trace!("Registered duty {}", registered.name());
        registered
    }

    /// Get a duty by its name, or else by one of its aliases.
    pub fn get(&self, name_or_alias: &str) -> Result<Duty> {
        let registry = self.registry.borrow();
        registry
            .duty(name_or_alias)
            .or_else(|| {
                registry
                    .alias_target(name_or_alias)
                    .and_then(|name| registry.duty(name))
            })
            .cloned()
            .ok_or_else(|| DutyError::UnknownDuty(name_or_alias.to_string()))
    }

    pub fn contains(&self, name_or_alias: &str) -> bool {
        self.get(name_or_alias).is_ok()
    }

    /// Remove every duty and alias.
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.duties.clear();
        registry.aliases.clear();
    }

    /// Duties in registration order.
    pub fn duties(&self) -> Vec<Duty> {
        self.registry.borrow().duties.clone()
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().duties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().duties.is_empty()
    }

    /// Duty names followed by aliases.
    pub fn names(&self) -> Vec<String> {
        let registry = self.registry.borrow();
        registry
            .duties
            .iter()
            .map(|d| d.name().to_string())
            .chain(registry.aliases.iter().map(|(alias, _)| alias.clone()))
            .collect()
    }

    /// Shell completion candidates for the words typed so far.
    ///
    /// Always the sorted names and aliases. When a duty name appears in
    /// `words`, the last one's parameters follow as sorted `name=` entries.
    pub fn completion_candidates<S: AsRef<str>>(&self, words: &[S]) -> Vec<String> {
        let mut names = self.names();
        names.sort();
        names.dedup();

        let last_duty = words
            .iter()
            .map(AsRef::<str>::as_ref)
            .rev()
            .find(|w| names.iter().any(|n| n == w))
            .and_then(|w| self.get(w).ok());

        let Some(duty) = last_duty else {
            return names;
        };

        let mut params: Vec<String> = duty
            .signature()
            .params()
            .iter()
            .filter(|p| p.kind != ParamKind::VarPositional)
            .map(|p| format!("{}=", p.name))
            .collect();
        params.sort();

        names.extend(params);
        names
    }

    /// One line per duty: its name, padded to at least 20 columns, and its summary.
    pub fn format_help(&self) -> String {
        let registry = self.registry.borrow();
        let width = registry
            .duties
            .iter()
            .map(|d| d.name().len())
            .max()
            .unwrap_or(0)
            .max(20);

        registry
            .duties
            .iter()
            .map(|d| format!("{:width$}  {}", d.name(), d.summary(), width = width))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Load duties from the collection's path.
    pub fn load(&self) -> Result<()> {
        let path = self.path();
        self.load_from(&path)
    }

    /// Load duties from a duties file, adding them in declaration order.
    pub fn load_from(&self, path: &Path) -> Result<()> {
        log::debug!("Loading duties from {}", path.display());
        let file = parse_duties_file(path)?;
        for duty in duties_from_file(&file, path)? {
            self.add(duty);
        }
        Ok(())
    }

    /// Find the duties file from the current directory upwards and load it.
    ///
    /// Returns the collection for that file, empty when none exists.
    pub fn discover() -> Result<Collection> {
        match find_duties_file() {
            Ok(path) => {
                let collection = Collection::new(&path);
                collection.load()?;
                Ok(collection)
            }
            Err(e) => {
                log::debug!("{}", e);
                Ok(Collection::default())
            }
        }
    }
}
