//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod ledger;

use std::sync::Arc;

use crate::{clock::Clock, config::LoanPolicyConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub ledger: ledger::CopyLedgerService,
    pub circulation: circulation::CirculationService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans: &LoanPolicyConfig, clock: Arc<dyn Clock>) -> Self {
        let ledger = ledger::CopyLedgerService::new(repository.clone(), clock.clone());

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository,
                ledger.clone(),
                loans,
                clock,
            ),
            ledger,
        }
    }
}
