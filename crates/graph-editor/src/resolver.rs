//! Resolution of raw parameter maps against an operator's schema

use crate::descriptor::OperatorDescriptor;
use crate::error::{GraphError, Result};
use crate::types::Configuration;

/// Resolves and validates raw parameter values for a node
///
/// The graph stores whatever the resolver returns and treats it as opaque.
pub trait ConfigurationResolver {
    fn resolve(&self, descriptor: &OperatorDescriptor, raw: &Configuration) -> Result<Configuration>;
}

/// Resolver that checks values against `OperatorDescriptor::parameters`
///
/// Defaults come first in schema order, raw values overlay them. Unknown
/// names, mistyped values and missing required parameters are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaResolver;

impl ConfigurationResolver for SchemaResolver {
    fn resolve(&self, descriptor: &OperatorDescriptor, raw: &Configuration) -> Result<Configuration> {
        let mut resolved = descriptor.default_configuration();

        for (name, value) in raw {
            let spec = descriptor.parameter(name).ok_or_else(|| {
                GraphError::invalid_configuration(&descriptor.alias, name, "unknown parameter")
            })?;
            if !spec.kind.accepts(value) {
                return Err(GraphError::invalid_configuration(
                    &descriptor.alias,
                    name,
                    format!("expected {:?} value, got {}", spec.kind, value),
                ));
            }
            resolved.insert(name.clone(), value.clone());
        }

        if let Some(missing) = descriptor
            .parameters
            .iter()
            .find(|p| p.required && !resolved.contains_key(&p.name))
        {
            return Err(GraphError::invalid_configuration(
                &descriptor.alias,
                &missing.name,
                "required parameter has no value",
            ));
        }

        // Keep schema order regardless of the order the raw map arrived in
        let mut ordered = Configuration::with_capacity(resolved.len());
        for spec in &descriptor.parameters {
            if let Some(value) = resolved.shift_remove(&spec.name) {
                ordered.insert(spec.name.clone(), value);
            }
        }
        Ok(ordered)
    }
}

/// Resolver that accepts any map unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

impl ConfigurationResolver for PassthroughResolver {
    fn resolve(&self, _descriptor: &OperatorDescriptor, raw: &Configuration) -> Result<Configuration> {
        Ok(raw.clone())
    }
}
