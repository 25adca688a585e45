//! Subcommand execution.

use std::convert::Infallible;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dbmap_core::{
    ClassGenerator, ClassRole, ClassTarget, ClassWriterFactory, DataMap, Entity, GenerationMode,
    GeneratorConfig, ImportConfig, Importer, ObjEntity,
};
use dbmap_sqlite::SqliteIntrospector;
use dbmap_xml::{CodecConfig, CodecError};
use thiserror::Error;
use tracing::info;

use crate::formatter::{ClassRow, EntityRow, Formatter};

/// Command errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A map document could not be loaded; rendered with source context.
    #[error("{0}")]
    Load(String),

    #[error("map error: {0}")]
    Codec(#[from] CodecError),

    #[error("import failed: {0}")]
    Import(#[from] dbmap_core::Error),

    #[error("cannot open database {path}: {message}")]
    Database { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// False when the command ran but found the input unusable.
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self { text, success: true }
    }
}

/// Options of the `import` command.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub sqlite: PathBuf,
    pub map_name: Option<String>,
    pub schema_pattern: Option<String>,
    pub table_pattern: Option<String>,
    pub table_types: Vec<String>,
    pub package: Option<String>,
    pub output: Option<PathBuf>,
}

/// Load a map document, with its dependency maps.
pub fn load_map(path: &Path, dependencies: &[PathBuf]) -> Result<DataMap, CliError> {
    let mut config = CodecConfig::new();
    for dependency in dependencies {
        config = config.with_dependency(Arc::new(load_map(dependency, &[])?));
    }

    let source = fs::read_to_string(path)?;
    dbmap_xml::load(source.as_bytes(), &config)
        .map_err(|e| CliError::Load(format!("{}:\n{}", path.display(), e.format_with_source(&source))))
}

/// Reverse-engineer a SQLite database into a map document.
pub fn import(options: &ImportOptions, formatter: &dyn Formatter) -> Result<CommandOutput, CliError> {
    let catalog = SqliteIntrospector::open(&options.sqlite).map_err(|e| CliError::Database {
        path: options.sqlite.clone(),
        message: e.to_string(),
    })?;

    let map_name = options.map_name.clone().unwrap_or_else(|| {
        options
            .sqlite
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| dbmap_core::config::DEFAULT_MAP_NAME.to_string())
    });
    let mut config = ImportConfig::new().with_map_name(map_name);
    if let Some(pattern) = &options.schema_pattern {
        config = config.with_schema_pattern(pattern);
    }
    if let Some(pattern) = &options.table_pattern {
        config = config.with_table_pattern(pattern);
    }
    if !options.table_types.is_empty() {
        config = config.with_table_types(options.table_types.iter().cloned());
    }
    if let Some(package) = &options.package {
        config = config.with_class_package(package);
    }

    let map = Importer::with_config(&catalog, config).import()?;

    match &options.output {
        Some(path) => {
            dbmap_xml::save_file(&map, path, &CodecConfig::default())?;
            info!(path = %path.display(), "map written");
            Ok(CommandOutput::ok(formatter.format_message(&format!(
                "Imported {} db entities and {} obj entities into {}",
                map.db_entities().count(),
                map.obj_entities().count(),
                path.display()
            ))))
        }
        None => Ok(CommandOutput::ok(dbmap_xml::to_string(&map)?)),
    }
}

/// Validate a map; fails when any finding is an error.
pub fn validate(path: &Path, dependencies: &[PathBuf], formatter: &dyn Formatter) -> Result<CommandOutput, CliError> {
    let map = load_map(path, dependencies)?;
    let diagnostics = dbmap_core::validate(&map);
    Ok(CommandOutput {
        text: formatter.format_diagnostics(&diagnostics),
        success: !diagnostics.iter().any(|d| d.is_error()),
    })
}

/// List the entities of a map.
pub fn show(path: &Path, dependencies: &[PathBuf], formatter: &dyn Formatter) -> Result<CommandOutput, CliError> {
    let map = load_map(path, dependencies)?;

    let mut rows = Vec::new();
    for entity in map.db_entities() {
        let mapping = match entity.parent_name() {
            Some(parent) => format!("derived from {}", parent),
            None => [entity.catalog(), entity.schema(), Some(entity.name())]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join("."),
        };
        rows.push(EntityRow::new(Entity::Db(entity), mapping));
    }
    for entity in map.obj_entities() {
        rows.push(EntityRow::new(Entity::Obj(entity), entity.db_entity().unwrap_or("-")));
    }

    Ok(CommandOutput::ok(formatter.format_entities(map.name(), &rows)))
}

/// Collects the classes a generation pass would write.
#[derive(Default)]
struct ClassListing {
    rows: Vec<ClassRow>,
}

impl ClassWriterFactory for ClassListing {
    type Writer = ClassRow;
    type Error = Infallible;

    fn open_writer(&mut self, entity: &ObjEntity, target: &ClassTarget) -> Result<Option<ClassRow>, Infallible> {
        Ok(Some(ClassRow {
            entity: entity.name().to_string(),
            class_name: target.qualified_name(),
            role: match target.role {
                ClassRole::Single => "single",
                ClassRole::Superclass => "superclass",
                ClassRole::Subclass => "subclass",
            },
        }))
    }

    fn close_writer(&mut self, writer: ClassRow) -> Result<(), Infallible> {
        self.rows.push(writer);
        Ok(())
    }
}

/// Options of the `classes` command.
#[derive(Debug, Clone, Default)]
pub struct ClassOptions {
    pub pair: bool,
    pub superclass_prefix: Option<String>,
    pub super_package: Option<String>,
}

/// List the classes generated for a map.
pub fn classes(
    path: &Path,
    dependencies: &[PathBuf],
    options: &ClassOptions,
    formatter: &dyn Formatter,
) -> Result<CommandOutput, CliError> {
    let map = load_map(path, dependencies)?;

    let mut config = GeneratorConfig::new();
    if options.pair {
        config = config.with_mode(GenerationMode::Pair);
    }
    if let Some(prefix) = &options.superclass_prefix {
        config = config.with_superclass_prefix(prefix);
    }
    if let Some(package) = &options.super_package {
        config = config.with_super_package(package);
    }

    let mut listing = ClassListing::default();
    let report = match ClassGenerator::new(config).generate(&map, &mut listing) {
        Ok(report) => report,
        Err(never) => match never {},
    };

    Ok(CommandOutput::ok(formatter.format_classes(&listing.rows, &report.skipped)))
}
