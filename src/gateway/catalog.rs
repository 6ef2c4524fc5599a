// src/gateway/catalog.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::gateway::descriptor::OperationDescriptor;
use crate::gateway::error::{CatalogError, GatewayError};

/// Ordered, append-only set of operations keyed by unique name.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<Arc<OperationDescriptor>>,
    index: HashMap<&'static str, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor. A name that is already registered is rejected and
    /// the catalog is left unchanged.
    pub fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), CatalogError> {
        let name = descriptor.name();
        if self.index.contains_key(name) {
            return Err(CatalogError::DuplicateName(name.to_string()));
        }
        self.index.insert(name, self.entries.len());
        self.entries.push(Arc::new(descriptor));
        Ok(())
    }

    pub fn register_all<I>(&mut self, descriptors: I) -> Result<(), CatalogError>
    where
        I: IntoIterator<Item = OperationDescriptor>,
    {
        descriptors.into_iter().try_for_each(|d| self.register(d))
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<OperationDescriptor>, GatewayError> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.entries[i]))
            .ok_or_else(|| GatewayError::NotFound(name.to_string()))
    }

    /// Every descriptor in registration order.
    pub fn list(&self) -> &[Arc<OperationDescriptor>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::contract::InputContract;
    use crate::gateway::envelope::Outcome;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct NoArgs {}

    fn op(name: &'static str) -> OperationDescriptor {
        OperationDescriptor::new(name, "test", "test op", InputContract::new(), |_: NoArgs| async {
            Ok(Outcome::success("value", json!({}), json!(1)))
        })
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut catalog = Catalog::new();
        catalog.register(op("get_quote")).unwrap();
        let err = catalog.register(op("get_quote")).unwrap_err();
        assert_eq!(err, CatalogError::DuplicateName("get_quote".into()));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn list_keeps_registration_order() {
        let mut catalog = Catalog::new();
        catalog
            .register_all(vec![op("b"), op("a"), op("c")])
            .unwrap();
        let names: Vec<_> = catalog.list().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn lookup_unknown_name() {
        let catalog = Catalog::new();
        let err = catalog.lookup("missing").unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(catalog.is_empty());
    }
}
