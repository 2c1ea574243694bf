// Copyright 2024-2026 authn-conform Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered, named collections of fixtures.

use std::collections::HashSet;

use serde::Serialize;

use super::{ExpectedOutcome, Fixture, FixtureError};

/// One catalog entry: a fixture and what it must observe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogCase {
    pub fixture: Fixture,
    pub expected: ExpectedOutcome,
}

/// Ordered set of uniquely named cases.
///
/// Iteration order is insertion order and is the order cases are probed
/// and reported in.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    name: String,
    cases: Vec<CatalogCase>,
    #[serde(skip)]
    names: HashSet<String>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add a case. Fails if the fixture is malformed or its name is taken.
    pub fn add_case(
        &mut self,
        fixture: Fixture,
        expected: ExpectedOutcome,
    ) -> Result<(), FixtureError> {
        fixture.validate()?;
        if !self.names.insert(fixture.name().to_string()) {
            return Err(FixtureError::DuplicateName {
                catalog: self.name.clone(),
                name: fixture.name().to_string(),
            });
        }
        self.cases.push(CatalogCase { fixture, expected });
        Ok(())
    }

    pub fn all_cases(&self) -> &[CatalogCase] {
        &self.cases
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CatalogCase> {
        self.cases.iter().find(|c| c.fixture.name() == name)
    }
}

/// Assembles a catalog from literal data, reporting the first invalid case
/// at [`build`](Self::build).
#[derive(Debug)]
pub struct CatalogBuilder {
    catalog: Catalog,
    error: Option<FixtureError>,
}

impl CatalogBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            catalog: Catalog::new(name),
            error: None,
        }
    }

    pub fn case(mut self, fixture: Fixture, expected: ExpectedOutcome) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.catalog.add_case(fixture, expected) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn build(self) -> Result<Catalog, FixtureError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.catalog),
        }
    }
}
