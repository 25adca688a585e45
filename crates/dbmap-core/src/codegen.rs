//! Class generation driver.
//!
//! The driver decides which classes exist for each object entity and in
//! what order; rendering is left to a [`ClassWriterFactory`].

use tracing::{debug, warn};

use crate::config::{GenerationMode, GeneratorConfig};
use crate::map::{DataMap, ObjEntity};
use crate::naming;

/// Role of a generated class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassRole {
    /// The only class of an entity.
    Single,
    /// Generated superclass holding the mapped properties.
    Superclass,
    /// Editable subclass extending the superclass.
    Subclass,
}

/// A class to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTarget {
    /// Package; empty for the default package.
    pub package: String,
    /// Simple class name.
    pub class_name: String,
    pub role: ClassRole,
}

impl ClassTarget {
    /// Package-qualified class name.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package, self.class_name)
        }
    }
}

/// Receives one open/close pair per generated class.
pub trait ClassWriterFactory {
    type Writer;
    type Error;

    /// Open a writer for a class. `None` skips the class.
    fn open_writer(
        &mut self,
        entity: &ObjEntity,
        target: &ClassTarget,
    ) -> Result<Option<Self::Writer>, Self::Error>;

    /// Finish a class.
    fn close_writer(&mut self, writer: Self::Writer) -> Result<(), Self::Error>;
}

/// What a generation pass produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Qualified names of classes written.
    pub generated: Vec<String>,
    /// Qualified names (or entity names, when there is no class name) of
    /// classes that were skipped.
    pub skipped: Vec<String>,
}

/// Drives a [`ClassWriterFactory`] over the object entities of a map.
#[derive(Debug, Clone, Default)]
pub struct ClassGenerator {
    config: GeneratorConfig,
}

impl ClassGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Classes to write for one entity, in writing order.
    pub fn targets(&self, entity: &ObjEntity) -> Vec<ClassTarget> {
        let (package, simple) = naming::split_class_name(entity.class_name());
        match self.config.mode {
            GenerationMode::SingleClass => vec![ClassTarget {
                package: package.to_string(),
                class_name: simple.to_string(),
                role: ClassRole::Single,
            }],
            GenerationMode::Pair => vec![
                ClassTarget {
                    package: self
                        .config
                        .super_package
                        .clone()
                        .unwrap_or_else(|| package.to_string()),
                    class_name: format!("{}{}", self.config.superclass_prefix, simple),
                    role: ClassRole::Superclass,
                },
                ClassTarget {
                    package: package.to_string(),
                    class_name: simple.to_string(),
                    role: ClassRole::Subclass,
                },
            ],
        }
    }

    /// Generate classes for every object entity of the map, in name order.
    pub fn generate<F: ClassWriterFactory>(
        &self,
        map: &DataMap,
        factory: &mut F,
    ) -> Result<GenerationReport, F::Error> {
        let mut report = GenerationReport::default();

        for entity in map.obj_entities() {
            if entity.class_name().is_empty() {
                warn!(entity = entity.name(), "obj entity has no class name, skipped");
                report.skipped.push(entity.name().to_string());
                continue;
            }

            for target in self.targets(entity) {
                let qualified = target.qualified_name();
                match factory.open_writer(entity, &target)? {
                    Some(writer) => {
                        factory.close_writer(writer)?;
                        debug!(entity = entity.name(), class = %qualified, "class generated");
                        report.generated.push(qualified);
                    }
                    None => report.skipped.push(qualified),
                }
            }
        }
        Ok(report)
    }
}
