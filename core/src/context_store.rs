//! In-memory financial context store.
//!
//! RULE: one context per company, last write wins. The store never
//! merges fields; `put` replaces the whole context.
//!
//! Read-modify-write sequences against one company must run inside
//! `with_company_lock`, which serialises them per key. Different
//! companies never wait on each other.

use crate::{
    context::{FinancialContext, DEFAULT_RUNWAY_EPSILON},
    error::{CoreError, CoreResult},
    types::CompanyId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

pub struct ContextStore {
    contexts:       RwLock<HashMap<CompanyId, FinancialContext>>,
    company_locks:  Mutex<HashMap<CompanyId, Arc<Mutex<()>>>>,
    runway_epsilon: f64,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore {
    pub fn new() -> Self {
        Self::with_runway_epsilon(DEFAULT_RUNWAY_EPSILON)
    }

    pub fn with_runway_epsilon(runway_epsilon: f64) -> Self {
        Self {
            contexts: RwLock::new(HashMap::new()),
            company_locks: Mutex::new(HashMap::new()),
            runway_epsilon,
        }
    }

    /// Fails with `NotFound` until a context has been put for this company.
    pub fn get(&self, company_id: &str) -> CoreResult<FinancialContext> {
        let contexts = self.contexts.read().map_err(|_| poisoned("contexts"))?;
        contexts
            .get(company_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                company_id: company_id.to_string(),
            })
    }

    /// Replace the company's context. Runway is re-derived before storing.
    pub fn put(&self, company_id: &str, mut context: FinancialContext) -> CoreResult<()> {
        if context.company_id != company_id {
            return Err(CoreError::invalid(
                "company_id",
                format!(
                    "context belongs to '{}' but was stored under '{company_id}'",
                    context.company_id
                ),
            ));
        }
        context.refresh_runway(self.runway_epsilon);
        context.validate()?;

        let mut contexts = self.contexts.write().map_err(|_| poisoned("contexts"))?;
        contexts.insert(company_id.to_string(), context);
        log::debug!("Stored context for '{company_id}' ({} companies)", contexts.len());
        Ok(())
    }

    pub fn contains(&self, company_id: &str) -> bool {
        self.contexts
            .read()
            .map(|c| c.contains_key(company_id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.contexts.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted, for stable listings.
    pub fn company_ids(&self) -> CoreResult<Vec<CompanyId>> {
        let contexts = self.contexts.read().map_err(|_| poisoned("contexts"))?;
        let mut ids: Vec<CompanyId> = contexts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    /// Run `f` while holding this company's transaction lock.
    pub fn with_company_lock<R>(
        &self,
        company_id: &str,
        f: impl FnOnce() -> CoreResult<R>,
    ) -> CoreResult<R> {
        let lock = self.company_lock(company_id)?;
        let _guard = lock.lock().map_err(|_| poisoned("company transaction"))?;
        f()
    }

    fn company_lock(&self, company_id: &str) -> CoreResult<Arc<Mutex<()>>> {
        let mut locks = self.company_locks.lock().map_err(|_| poisoned("company locks"))?;
        Ok(locks
            .entry(company_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }
}

fn poisoned(what: &str) -> CoreError {
    CoreError::computation(format!("{what} lock poisoned by a panicked writer"))
}
