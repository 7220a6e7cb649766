//! Archive query methods.

use crate::model::{ArchiveModel, EntryRecord};
use crate::{Error, Password, Result};

use super::{Archive, EntrySelector};

impl<R> Archive<R> {
    /// Returns all entries in central directory order.
    pub fn entries(&self) -> &[EntryRecord] {
        &self.model.entries
    }

    /// Returns the parsed archive model.
    pub fn model(&self) -> &ArchiveModel {
        &self.model
    }

    /// Returns the first entry named `name`, if any.
    pub fn get_entry(&self, name: &str) -> Option<&EntryRecord> {
        self.model.find(name)
    }

    /// Returns the first entry named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no entry has that name.
    pub fn entry(&self, name: &str) -> Result<&EntryRecord> {
        self.get_entry(name).ok_or_else(|| Error::EntryNotFound {
            name: name.to_string(),
        })
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.model.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.model.is_empty()
    }

    /// Returns the archive comment.
    pub fn comment(&self) -> &str {
        &self.model.comment
    }

    /// Returns true if the archive spans more than one volume.
    pub fn is_split(&self) -> bool {
        self.model.split.is_some()
    }

    /// Sets the password used for encrypted entries.
    pub fn set_password(&mut self, password: impl Into<Password>) {
        self.password = Some(password.into());
    }

    /// Consumes the archive and returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Resolves a selector to an entry index.
    pub(crate) fn resolve(&self, selector: &EntrySelector) -> Result<usize> {
        let not_found = |name: &str| Error::EntryNotFound {
            name: name.to_string(),
        };
        match selector {
            EntrySelector::Name(name) => self
                .model
                .find(name)
                .map(|e| e.index)
                .ok_or_else(|| not_found(name)),
            EntrySelector::Record { index, name } => match self.model.entries.get(*index) {
                Some(entry) if entry.name == *name => Ok(*index),
                _ => self
                    .model
                    .find(name)
                    .map(|e| e.index)
                    .ok_or_else(|| not_found(name)),
            },
        }
    }
}
