//! Request-shape policy limits shared by the compilers and the resolver.
//!
//! This module is the sole owner of document-size rules; compilers enforce
//! them at their boundaries and must not redefine them. Limits bound the
//! work a single request can demand, they never change compile semantics.

use crate::error::MalformedDocument;
use serde::{Deserialize, Serialize};

const DEFAULT_MAX_CRITERIA_DEPTH: usize = 32;
const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;
const DEFAULT_MAX_ORDER_PATHS: usize = 16;

///
/// QueryPolicy
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryPolicy {
    pub max_criteria_depth: usize,
    pub max_include_depth: usize,
    pub max_order_paths: usize,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            max_criteria_depth: DEFAULT_MAX_CRITERIA_DEPTH,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            max_order_paths: DEFAULT_MAX_ORDER_PATHS,
        }
    }
}

impl QueryPolicy {
    pub(crate) const fn check_criteria_depth(&self, depth: usize) -> Result<(), MalformedDocument> {
        if depth > self.max_criteria_depth {
            return Err(MalformedDocument::CriteriaTooDeep {
                limit: self.max_criteria_depth,
            });
        }

        Ok(())
    }

    pub(crate) const fn check_include_depth(&self, depth: usize) -> Result<(), MalformedDocument> {
        if depth > self.max_include_depth {
            return Err(MalformedDocument::IncludeTooDeep {
                limit: self.max_include_depth,
            });
        }

        Ok(())
    }

    pub(crate) const fn check_order_paths(&self, count: usize) -> Result<(), MalformedDocument> {
        if count > self.max_order_paths {
            return Err(MalformedDocument::TooManyOrderPaths {
                limit: self.max_order_paths,
            });
        }

        Ok(())
    }
}

///
/// TESTS
///
