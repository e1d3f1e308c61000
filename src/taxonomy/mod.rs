//! Four-level equipment taxonomy: Industry → AssetClass → Make → Model.
//!
//! Every level is keyed by its parent ids plus a normalized name. Import
//! paths go through [`find_or_create`], which reuses an existing row and
//! tolerates a concurrent writer creating the same row first. Direct
//! creation goes through [`create_strict`], which refuses duplicates.

mod service;
mod tables;

pub use service::{PathNames, Taxonomy, TaxonomyPath};
pub use tables::{
    AssetClassScope, AssetClasses, Industries, IndustryScope, MakeScope, Makes, Models, NoScope,
};

use std::fmt;

use crate::error::{Error, Result};
use crate::types::{AssetClass, Industry, Make, Model};

/// Trims and lowercases a taxonomy name. Returns `None` when nothing is left.
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Common accessors for the four taxonomy row types.
pub trait TaxonomyRow {
    fn id(&self) -> i64;
    fn name(&self) -> &str;
}

macro_rules! impl_taxonomy_row {
    ($($ty:ty),*) => {
        $(impl TaxonomyRow for $ty {
            fn id(&self) -> i64 {
                self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_taxonomy_row!(Industry, AssetClass, Make, Model);

/// One taxonomy level as seen by the resolver: lookup and insert by
/// (scope, normalized name).
pub trait TaxonomyTable {
    type Scope: Copy + fmt::Debug;
    type Row: TaxonomyRow;

    /// Display label used in messages, e.g. `Make`.
    const LABEL: &'static str;
    /// Suffix describing the uniqueness scope, e.g. ` for this industry`.
    const IN_SCOPE: &'static str;

    fn find(&self, scope: Self::Scope, name: &str) -> Result<Option<Self::Row>>;
    fn insert(
        &self,
        scope: Self::Scope,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self::Row>;
}

fn require_name<T: TaxonomyTable + ?Sized>(name: &str) -> Result<String> {
    normalize_name(name)
        .ok_or_else(|| Error::BadRequest(format!("{} name cannot be empty", T::LABEL)))
}

pub(crate) fn conflict<T: TaxonomyTable + ?Sized>(name: &str) -> Error {
    Error::Conflict(format!(
        "{} \"{}\" already exists{}",
        T::LABEL,
        name,
        T::IN_SCOPE
    ))
}

/// Returns the row named `name` in `scope`, creating it when absent.
///
/// A unique violation on insert means another writer created the row
/// between our lookup and insert; the lookup is retried once and that row
/// is returned. If the retry still finds nothing the violation is returned.
pub fn find_or_create<T: TaxonomyTable + ?Sized>(
    table: &T,
    scope: T::Scope,
    name: &str,
) -> Result<T::Row> {
    let name = require_name::<T>(name)?;

    if let Some(row) = table.find(scope, &name)? {
        return Ok(row);
    }

    match table.insert(scope, &name, None) {
        Ok(row) => {
            tracing::debug!("Created {} '{}' ({:?})", T::LABEL, name, scope);
            Ok(row)
        }
        Err(Error::AlreadyExists) => {
            tracing::debug!(
                "{} '{}' ({:?}) was created concurrently, re-reading",
                T::LABEL,
                name,
                scope
            );
            table.find(scope, &name)?.ok_or(Error::AlreadyExists)
        }
        Err(e) => Err(e),
    }
}

/// Creates a row, failing with `Conflict` if the name is taken in `scope`.
pub fn create_strict<T: TaxonomyTable + ?Sized>(
    table: &T,
    scope: T::Scope,
    name: &str,
    description: Option<&str>,
) -> Result<T::Row> {
    let name = require_name::<T>(name)?;

    if table.find(scope, &name)?.is_some() {
        return Err(conflict::<T>(&name));
    }

    table
        .insert(scope, &name, description)
        .map_err(|e| match e {
            Error::AlreadyExists => conflict::<T>(&name),
            other => other,
        })
}
