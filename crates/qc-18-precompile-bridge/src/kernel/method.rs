//! # Method Descriptors
//!
//! Selector-addressed operations exposed by one precompile.

use crate::abi::codec::{canonical_signature, parse_types, ParamType};
use crate::domain::services::selector;
use crate::errors::AbiError;
use std::collections::HashMap;

/// One callable operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Method name, e.g. `send`.
    pub name: String,
    /// Argument types.
    pub inputs: Vec<ParamType>,
    /// Return types.
    pub outputs: Vec<ParamType>,
    /// First four bytes of the signature hash.
    pub selector: [u8; 4],
}

impl MethodDescriptor {
    /// Declares a method from Solidity type strings.
    pub fn new(name: &str, inputs: &[&str], outputs: &[&str]) -> Result<Self, AbiError> {
        let inputs = parse_types(inputs)?;
        let outputs = parse_types(outputs)?;
        let selector = selector(&canonical_signature(name, &inputs));
        Ok(Self {
            name: name.to_string(),
            inputs,
            outputs,
            selector,
        })
    }

    /// Canonical signature string.
    #[must_use]
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.inputs)
    }
}

/// Selector lookup table.
#[derive(Clone, Debug, Default)]
pub struct MethodRegistry {
    by_selector: HashMap<[u8; 4], MethodDescriptor>,
}

impl MethodRegistry {
    /// Builds a registry. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(methods: Vec<MethodDescriptor>) -> Self {
        Self {
            by_selector: methods.into_iter().map(|m| (m.selector, m)).collect(),
        }
    }

    /// Resolves the selector at the head of `input`.
    ///
    /// `None` for inputs shorter than four bytes or unknown selectors.
    #[must_use]
    pub fn resolve(&self, input: &[u8]) -> Option<&MethodDescriptor> {
        let head: [u8; 4] = input.get(..4)?.try_into().ok()?;
        self.by_selector.get(&head)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_selector.len()
    }

    /// Returns true if no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_selector.is_empty()
    }
}
