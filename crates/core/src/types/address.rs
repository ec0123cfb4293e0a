//! Shipping addresses.
//!
//! Two shapes exist: [`SavedAddress`] lives in a customer's address book and
//! [`ShippingAddress`] is the snapshot copied onto an order. The snapshot never
//! changes when the book is edited later.

use serde::{Deserialize, Serialize};

use super::id::AddressId;

/// Errors raised by [`AddressBook`] operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address not found")]
    NotFound,
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Shipping address snapshot stored on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    /// Recipient name.
    pub name: String,
    /// Street and number.
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Name of the first blank required field, if any.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        [
            ("name", &self.name),
            ("address", &self.address),
            ("city", &self.city),
            ("province", &self.province),
            ("postalCode", &self.postal_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }

    /// Snapshot a saved address for an order addressed to `recipient`.
    #[must_use]
    pub fn from_saved(recipient: &str, saved: &SavedAddress) -> Self {
        Self {
            name: recipient.to_owned(),
            address: saved.street.clone(),
            city: saved.city.clone(),
            province: saved.state.clone(),
            postal_code: saved.postal_code.clone(),
            phone: (!saved.phone.is_empty()).then(|| saved.phone.clone()),
        }
    }
}

/// An entry in a customer's address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAddress {
    pub id: AddressId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub is_default: bool,
}

/// Fields submitted when adding or editing a saved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    fn validate(&self) -> Result<(), AddressError> {
        let fields = [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ];
        match fields.into_iter().find(|(_, v)| v.trim().is_empty()) {
            Some((field, _)) => Err(AddressError::MissingField(field)),
            None => Ok(()),
        }
    }
}

/// A customer's saved addresses.
///
/// Maintains the default-address invariant:
/// - at most one address is flagged default
/// - the first address added becomes the default
/// - adding or updating an address flagged default clears the flag elsewhere
/// - removing the default promotes the first remaining address
///
/// Editing the current default with `is_default = false` leaves the book
/// without a flagged default; [`AddressBook::preferred`] then falls back to
/// the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    addresses: Vec<SavedAddress>,
}

impl AddressBook {
    /// Wrap addresses loaded from storage, in stored order.
    #[must_use]
    pub const fn from_saved(addresses: Vec<SavedAddress>) -> Self {
        Self { addresses }
    }

    #[must_use]
    pub fn addresses(&self) -> &[SavedAddress] {
        &self.addresses
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<SavedAddress> {
        self.addresses
    }

    #[must_use]
    pub fn get(&self, id: AddressId) -> Option<&SavedAddress> {
        self.addresses.iter().find(|a| a.id == id)
    }

    /// The flagged default address, or the first one when none is flagged.
    #[must_use]
    pub fn preferred(&self) -> Option<&SavedAddress> {
        self.addresses
            .iter()
            .find(|a| a.is_default)
            .or_else(|| self.addresses.first())
    }

    /// Append a new address and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingField`] when a required field is blank.
    pub fn add(&mut self, input: AddressInput) -> Result<AddressId, AddressError> {
        input.validate()?;

        let is_default = input.is_default || self.addresses.is_empty();
        if is_default {
            self.clear_default();
        }

        let id = AddressId::generate();
        self.addresses.push(SavedAddress {
            id,
            street: input.street,
            city: input.city,
            state: input.state,
            postal_code: input.postal_code,
            country: input.country,
            phone: input.phone,
            is_default,
        });
        Ok(id)
    }

    /// Replace the fields of an existing address.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown id and
    /// [`AddressError::MissingField`] when a required field is blank.
    pub fn update(&mut self, id: AddressId, input: AddressInput) -> Result<(), AddressError> {
        input.validate()?;
        if self.get(id).is_none() {
            return Err(AddressError::NotFound);
        }

        if input.is_default {
            self.clear_default();
        }

        let entry = self
            .addresses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AddressError::NotFound)?;
        entry.street = input.street;
        entry.city = input.city;
        entry.state = input.state;
        entry.postal_code = input.postal_code;
        entry.country = input.country;
        entry.phone = input.phone;
        entry.is_default = input.is_default;
        Ok(())
    }

    /// Remove an address, promoting the first remaining one if the removed
    /// address was the default.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::NotFound`] for an unknown id.
    pub fn remove(&mut self, id: AddressId) -> Result<SavedAddress, AddressError> {
        let index = self
            .addresses
            .iter()
            .position(|a| a.id == id)
            .ok_or(AddressError::NotFound)?;
        let removed = self.addresses.remove(index);

        if removed.is_default
            && let Some(first) = self.addresses.first_mut()
        {
            first.is_default = true;
        }
        Ok(removed)
    }

    fn clear_default(&mut self) {
        for address in &mut self.addresses {
            address.is_default = false;
        }
    }
}

/// One change to an address book, applied by a repository while it holds
/// the book locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressEdit {
    Add(AddressInput),
    Update(AddressId, AddressInput),
    Remove(AddressId),
}

impl AddressEdit {
    /// Apply the change under the book's default-address rules.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError`] for a blank field or an unknown id; the book
    /// is left unchanged.
    pub fn apply(self, book: &mut AddressBook) -> Result<(), AddressError> {
        match self {
            Self::Add(input) => book.add(input).map(|_| ()),
            Self::Update(id, input) => book.update(id, input),
            Self::Remove(id) => book.remove(id).map(|_| ()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn input(street: &str, is_default: bool) -> AddressInput {
        AddressInput {
            street: street.to_owned(),
            city: "Córdoba".to_owned(),
            state: "Córdoba".to_owned(),
            postal_code: "5000".to_owned(),
            country: "Argentina".to_owned(),
            phone: "351-555-0101".to_owned(),
            is_default,
        }
    }

    fn default_count(book: &AddressBook) -> usize {
        book.addresses().iter().filter(|a| a.is_default).count()
    }

    #[test]
    fn test_first_address_becomes_default() {
        let mut book = AddressBook::default();
        let id = book.add(input("Av. Colón 100", false)).unwrap();
        assert!(book.get(id).unwrap().is_default);
    }

    #[test]
    fn test_adding_default_clears_others() {
        let mut book = AddressBook::default();
        book.add(input("Av. Colón 100", false)).unwrap();
        let second = book.add(input("San Martín 20", true)).unwrap();

        assert_eq!(default_count(&book), 1);
        assert_eq!(book.preferred().unwrap().id, second);
    }

    #[test]
    fn test_update_to_default_clears_others() {
        let mut book = AddressBook::default();
        let first = book.add(input("Av. Colón 100", false)).unwrap();
        let second = book.add(input("San Martín 20", false)).unwrap();

        book.update(second, input("San Martín 22", true)).unwrap();

        assert_eq!(default_count(&book), 1);
        assert!(!book.get(first).unwrap().is_default);
        assert_eq!(book.get(second).unwrap().street, "San Martín 22");
    }

    #[test]
    fn test_removing_default_promotes_first_remaining() {
        let mut book = AddressBook::default();
        let first = book.add(input("Av. Colón 100", false)).unwrap();
        let second = book.add(input("San Martín 20", false)).unwrap();
        book.add(input("Belgrano 3", false)).unwrap();

        book.remove(first).unwrap();

        assert_eq!(default_count(&book), 1);
        assert_eq!(book.preferred().unwrap().id, second);
    }

    #[test]
    fn test_removing_non_default_keeps_default() {
        let mut book = AddressBook::default();
        let first = book.add(input("Av. Colón 100", false)).unwrap();
        let second = book.add(input("San Martín 20", false)).unwrap();

        book.remove(second).unwrap();

        assert_eq!(book.preferred().unwrap().id, first);
        assert_eq!(default_count(&book), 1);
    }

    #[test]
    fn test_removing_last_address_leaves_empty_book() {
        let mut book = AddressBook::default();
        let only = book.add(input("Av. Colón 100", false)).unwrap();
        book.remove(only).unwrap();
        assert!(book.preferred().is_none());
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut book = AddressBook::default();
        book.add(input("Av. Colón 100", false)).unwrap();
        let missing = AddressId::generate();

        assert_eq!(book.remove(missing), Err(AddressError::NotFound));
        assert_eq!(
            book.update(missing, input("x", false)),
            Err(AddressError::NotFound)
        );
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let mut book = AddressBook::default();
        let mut bad = input("Av. Colón 100", false);
        bad.phone = "  ".to_owned();
        assert_eq!(book.add(bad), Err(AddressError::MissingField("phone")));
        assert!(book.addresses().is_empty());
    }

    #[test]
    fn test_preferred_falls_back_to_first() {
        let mut book = AddressBook::default();
        let first = book.add(input("Av. Colón 100", false)).unwrap();
        book.add(input("San Martín 20", false)).unwrap();
        book.update(first, input("Av. Colón 100", false)).unwrap();

        assert_eq!(default_count(&book), 0);
        assert_eq!(book.preferred().unwrap().id, first);
    }

    #[test]
    fn test_snapshot_maps_street_and_state() {
        let mut book = AddressBook::default();
        book.add(input("Av. Colón 100", false)).unwrap();
        let snapshot = ShippingAddress::from_saved("Ana", book.preferred().unwrap());

        assert_eq!(snapshot.name, "Ana");
        assert_eq!(snapshot.address, "Av. Colón 100");
        assert_eq!(snapshot.province, "Córdoba");
        assert_eq!(snapshot.phone.as_deref(), Some("351-555-0101"));
        assert_eq!(snapshot.first_missing_field(), None);
    }

    #[test]
    fn test_edit_applies_book_rules() {
        let mut book = AddressBook::default();
        AddressEdit::Add(input("Av. Colón 100", false))
            .apply(&mut book)
            .unwrap();
        AddressEdit::Add(input("San Martín 20", true))
            .apply(&mut book)
            .unwrap();
        let first = book.addresses()[0].id;

        AddressEdit::Remove(book.addresses()[1].id)
            .apply(&mut book)
            .unwrap();
        assert_eq!(book.addresses().len(), 1);
        assert!(book.get(first).unwrap().is_default);

        let before = book.clone();
        let err = AddressEdit::Update(AddressId::generate(), input("Mitre 5", false))
            .apply(&mut book)
            .unwrap_err();
        assert_eq!(err, AddressError::NotFound);
        assert_eq!(book, before);
    }
}
