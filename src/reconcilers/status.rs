// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `ClusterRelocation` resources.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Ready")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed
//!
//! # Example
//!
//! ```rust,no_run
//! use ingress_relocator::reconcilers::status::create_condition;
//!
//! let condition = create_condition(
//!     "Ready",
//!     "True",
//!     "Relocated",
//!     "Ingress relocated to apps.example.com"
//! );
//! ```

use crate::crd::{ClusterRelocation, ClusterRelocationStatus, Condition};
use crate::errors::Result;
use crate::store::ClusterStore;
use chrono::Utc;
use kube::ResourceExt;
use serde_json::json;
use tracing::debug;

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Arguments
///
/// * `condition_type` - The type of condition (e.g., "Ready")
/// * `status` - The status: "True", "False", or "Unknown"
/// * `reason` - A programmatic identifier in `CamelCase` (e.g., "`Relocated`")
/// * `message` - A human-readable explanation
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// Preserves the `lastTransitionTime` if the status hasn't changed, or sets a
/// new timestamp if it has.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists to check if they are semantically equal.
///
/// `lastTransitionTime` is ignored; only type, status, reason and message are
/// compared.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }

    new.iter().all(|new_cond| {
        current.iter().any(|curr_cond| {
            curr_cond.r#type == new_cond.r#type
                && curr_cond.status == new_cond.status
                && curr_cond.reason == new_cond.reason
                && curr_cond.message == new_cond.message
        })
    })
}

/// Collects status changes for one `ClusterRelocation` and writes them in a
/// single status patch.
///
/// Nothing is written when the collected status is semantically equal to the
/// one the relocation was read with, so a converged cycle does not trigger
/// another watch event.
///
/// # Example
///
/// ```rust,ignore
/// use ingress_relocator::reconcilers::status::RelocationStatusUpdater;
///
/// let mut updater = RelocationStatusUpdater::new(&relocation);
/// updater.set_condition("Ready", "True", "Relocated", "Ingress relocated");
/// updater.set_observed_generation(relocation.metadata.generation);
/// updater.apply(store).await?;
/// ```
pub struct RelocationStatusUpdater {
    name: String,
    current_status: Option<ClusterRelocationStatus>,
    new_status: ClusterRelocationStatus,
}

impl RelocationStatusUpdater {
    /// Create a new status updater seeded with the relocation's current status.
    #[must_use]
    pub fn new(relocation: &ClusterRelocation) -> Self {
        let current_status = relocation.status.clone();
        let new_status = current_status.clone().unwrap_or_default();

        Self {
            name: relocation.name_any(),
            current_status,
            new_status,
        }
    }

    /// Update or add a condition (in-memory only, no API call).
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: &str,
        reason: &str,
        message: &str,
    ) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    /// Set the observed generation (in-memory only, no API call).
    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// Returns `true` if the collected status differs from the current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// The conditions that [`Self::apply`] would write.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.new_status.conditions
    }

    /// Write the collected status (single API call), skipping unchanged status.
    ///
    /// # Returns
    ///
    /// `true` if a patch was sent.
    ///
    /// # Errors
    ///
    /// Returns an error if the status patch fails.
    pub async fn apply(&self, store: &dyn ClusterStore) -> Result<bool> {
        if !self.has_changes() {
            debug!(
                "ClusterRelocation {} status unchanged, skipping update",
                self.name
            );
            return Ok(false);
        }

        let patch = json!({ "status": self.new_status });
        store.patch_relocation_status(&self.name, &patch).await?;

        debug!(
            "Updated ClusterRelocation {} status: {} condition(s), observedGeneration {:?}",
            self.name,
            self.new_status.conditions.len(),
            self.new_status.observed_generation
        );

        Ok(true)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
