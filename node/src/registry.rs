//! # Product Registry
//!
//! In-memory home for the products this node hosts: one
//! [`InsuranceFactory`] that creates them and a map from vault address to
//! the wired product. The registry itself is synchronous and
//! single-writer; the API layer serializes access with an async lock, so
//! every product call runs to completion before the next is observed.

use std::collections::HashMap;

use parapool_escrow::{
    Address, FactoryError, InsuranceFactory, InsuranceProduct, Period, ReceiptCoin, RecordedEvent,
};

/// The products hosted by this node, keyed by vault address.
#[derive(Debug, Default)]
pub struct ProductRegistry {
    factory: InsuranceFactory,
    products: HashMap<Address, InsuranceProduct>,
}

impl ProductRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factory: InsuranceFactory::new(),
            products: HashMap::new(),
        }
    }

    /// Creates a product through the factory and takes ownership of it.
    /// Returns the new vault address.
    ///
    /// # Errors
    ///
    /// Propagates [`FactoryError`] from the factory; nothing is retained
    /// on failure.
    #[allow(clippy::too_many_arguments)]
    pub fn create_product(
        &mut self,
        caller: Address,
        name_investor: &str,
        name_insuree: &str,
        insurance_period: Period,
        signature_period: Period,
        rate_percent: u64,
    ) -> Result<Address, FactoryError> {
        let product = self.factory.create_insurance_for(
            caller,
            name_investor,
            name_insuree,
            insurance_period,
            signature_period,
            rate_percent,
        )?;
        let vault_address = product.vault().address();
        self.products.insert(vault_address, product);
        Ok(vault_address)
    }

    /// Looks up a product by vault address.
    pub fn get(&self, vault: &Address) -> Option<&InsuranceProduct> {
        self.products.get(vault)
    }

    /// Looks up a product by vault address for mutation.
    pub fn get_mut(&mut self, vault: &Address) -> Option<&mut InsuranceProduct> {
        self.products.get_mut(vault)
    }

    /// Iterates over all hosted products.
    pub fn iter(&self) -> impl Iterator<Item = &InsuranceProduct> {
        self.products.values()
    }

    /// Number of hosted products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the registry hosts no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Number of hosted products not yet in a terminal state.
    pub fn open_count(&self) -> usize {
        self.products
            .values()
            .filter(|p| !p.vault().current_state().is_terminal())
            .count()
    }

    /// Resolves a receipt coin by address across all hosted products.
    pub fn find_coin(&self, address: &Address) -> Option<&ReceiptCoin> {
        self.products.values().find_map(|product| {
            if product.investor_coin().address() == *address {
                Some(product.investor_coin())
            } else if product.insuree_coin().address() == *address {
                Some(product.insuree_coin())
            } else {
                None
            }
        })
    }

    /// Creation records from sequence number `seq` onwards.
    pub fn events_since(&self, seq: u64) -> &[RecordedEvent] {
        self.factory.events_since(seq)
    }

    /// Total number of creation records published so far.
    pub fn event_count(&self) -> usize {
        self.factory.events().len()
    }
}
