// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helpers for Kubernetes API list operations.
//!
//! Route lists span every namespace of the cluster, so they are fetched in pages
//! to bound memory usage and API server load.

use crate::constants::KUBE_LIST_PAGE_SIZE;
use kube::{api::ListParams, Api, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// List all resources with automatic pagination.
///
/// # Arguments
///
/// * `api` - Kubernetes API client for the resource type
/// * `list_params` - Base list parameters (labels, fields, etc.)
///
/// # Returns
///
/// Vector of all resources, fetched in pages of [`KUBE_LIST_PAGE_SIZE`]
///
/// # Errors
///
/// Returns an error if any page request fails.
pub async fn list_all_paginated<K>(
    api: &Api<K>,
    mut list_params: ListParams,
) -> Result<Vec<K>, kube::Error>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    list_params.limit = Some(KUBE_LIST_PAGE_SIZE);

    let mut all_items = Vec::new();
    let mut page_count = 0;

    loop {
        page_count += 1;
        let result = api.list(&list_params).await?;

        let item_count = result.items.len();
        all_items.extend(result.items);

        debug!(
            page = page_count,
            items_in_page = item_count,
            total_items = all_items.len(),
            "Fetched page from Kubernetes API"
        );

        match result.metadata.continue_ {
            Some(token) if !token.is_empty() => list_params.continue_token = Some(token),
            _ => break,
        }
    }

    debug!(
        total_pages = page_count,
        total_items = all_items.len(),
        "Completed paginated list operation"
    );

    Ok(all_items)
}
