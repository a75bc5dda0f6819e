//! The feature seam: independently-configured modules contributing
//! fragments and parameters to one program.

use skein_core::param::ParameterRegistry;

use crate::assembler::Assembler;
use crate::error::AssemblyError;

/// A feature module of the generated executable.
///
/// Each feature contributes fragments to the stages it cares about and
/// registers its own parameters. Enabling a feature must never require
/// another feature to change its registrations; the builder applies
/// features in the order given and the assembler keeps per-stage
/// registration order.
pub trait Feature {
    /// The feature's name, used in diagnostics.
    fn name(&self) -> &str;

    /// Register this feature's fragments and parameters.
    fn contribute(&self, builder: &mut ProgramBuilder) -> Result<(), AssemblyError>;
}

/// Accumulates feature contributions for one generated executable.
///
/// Seeds the base parameters every run carries (grid size, timestep,
/// iteration cadence), then lets features layer theirs on top in
/// registration order.
#[derive(Clone, Debug)]
pub struct ProgramBuilder {
    name: String,
    assembler: Assembler,
    params: ParameterRegistry,
}

impl ProgramBuilder {
    /// Create a builder for a program of the given name, with the base
    /// parameter set registered.
    pub fn new(name: impl Into<String>) -> Self {
        let mut params = ParameterRegistry::new();
        params.set("nx", 32i64);
        params.set("ny", 32i64);
        params.set("nz", 32i64);
        params.set("dt", 0.01);
        params.set("niter_todo", 8i64);
        params.set("niter_out", 8i64);
        params.set("niter_stat", 1i64);
        params.set("dealias_type", 0i64);
        params.set("nparticles", 0i64);
        Self {
            name: name.into(),
            assembler: Assembler::new(),
            params,
        }
    }

    /// Apply a feature, consuming and returning the builder.
    pub fn with_feature(mut self, feature: &dyn Feature) -> Result<Self, AssemblyError> {
        feature.contribute(&mut self)?;
        Ok(self)
    }

    /// The program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The assembler collecting stage fragments.
    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    /// Mutable access for feature registration.
    pub fn assembler_mut(&mut self) -> &mut Assembler {
        &mut self.assembler
    }

    /// The parameter registry.
    pub fn params(&self) -> &ParameterRegistry {
        &self.params
    }

    /// Mutable access for feature registration and driver overrides.
    pub fn params_mut(&mut self) -> &mut ParameterRegistry {
        &mut self.params
    }

    /// Assemble the program text.
    pub fn assemble(&self) -> Result<String, AssemblyError> {
        self.assembler.assemble()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Stage;

    struct Noop;
    impl Feature for Noop {
        fn name(&self) -> &str {
            "noop"
        }
        fn contribute(&self, _: &mut ProgramBuilder) -> Result<(), AssemblyError> {
            Ok(())
        }
    }

    #[test]
    fn base_parameters_are_seeded() {
        let builder = ProgramBuilder::new("test");
        assert_eq!(builder.params().get_int("niter_out").unwrap(), 8);
        assert_eq!(builder.params().get_int("dealias_type").unwrap(), 0);
    }

    #[test]
    fn with_feature_chains() {
        let builder = ProgramBuilder::new("test").with_feature(&Noop).unwrap();
        assert_eq!(builder.assembler().fragments(Stage::Includes).len(), 0);
    }
}
