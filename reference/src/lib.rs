#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative reference data for the samgen generator.
//!
//! The repository is loaded once at startup and then only read. Before
//! loading it answers every query with
//! [`ConfigurationError::ReferenceNotLoaded`]; a loaded but empty table
//! answers with [`ConfigurationError::EmptyTable`].

use std::{
    collections::BTreeMap,
    fs::File,
    io::Read,
    path::Path,
};

use anyhow::{Context, Result};
use samgen_core::{ConfigurationError, LookupError, TableKind};
use tracing::{debug, warn};

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

/// Column names the emitter reads from the reference tables.
pub mod columns {
    /// Discovery model display name.
    pub const DISCOVERY_MODEL: &str = "discovery_model";
    /// Discovery model identifier.
    pub const DISCOVERY_SYS_ID: &str = "discovery_sys_id";
    /// Normalized product name; categories resolve against this column.
    pub const NORM_PRODUCT: &str = "norm_product";
    /// Normalized product identifier.
    pub const NORM_PRODUCT_SYS_ID: &str = "norm_product_sys_id";
    /// Normalized publisher name.
    pub const NORM_PUBLISHER: &str = "norm_publisher";
    /// Normalized publisher identifier.
    pub const NORM_PUBLISHER_SYS_ID: &str = "norm_publisher_sys_id";
    /// Raw product name.
    pub const PRODUCT: &str = "product";
    /// Raw publisher name.
    pub const PUBLISHER: &str = "publisher";
    /// Product version.
    pub const VERSION: &str = "version";
    /// Software installation display name.
    pub const SOFTWARE_INSTALL: &str = "software_install";
    /// Software installation identifier.
    pub const SOFTWARE_INSTALL_SYS_ID: &str = "software_install_sys_id";
    /// License identifier referenced by usage records.
    pub const LICENSE_SYS_ID: &str = "license_sys_id";
    /// User display name.
    pub const USER: &str = "user";
    /// User identifier.
    pub const USER_SYS_ID: &str = "user_sys_id";
    /// Computer display name.
    pub const COMPUTER_NAME: &str = "computer_name";
    /// Computer identifier.
    pub const COMPUTER_SYS_ID: &str = "computer_sys_id";
    /// Workstation display name.
    pub const WORKSTATION: &str = "workstation";
    /// Workstation identifier.
    pub const WORKSTATION_SYS_ID: &str = "workstation_sys_id";
    /// Group display name.
    pub const GROUP: &str = "group";
    /// Group identifier.
    pub const GROUP_SYS_ID: &str = "group_sys_id";
    /// License server display name.
    pub const LICENSE_SERVER: &str = "license_server";
    /// License server identifier.
    pub const LICENSE_SERVER_SYS_ID: &str = "license_server_sys_id";
    /// License type display name.
    pub const LICENSE_TYPE: &str = "license_type";
    /// License type identifier.
    pub const LICENSE_TYPE_SYS_ID: &str = "license_type_sys_id";
}

/// One row of a reference table, mapping column names to string values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    table: TableKind,
    columns: BTreeMap<String, String>,
}

impl Row {
    /// Creates a row belonging to the provided table.
    #[must_use]
    pub fn new<K, V>(table: TableKind, columns: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            table,
            columns: columns
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Table the row belongs to.
    #[must_use]
    pub const fn table(&self) -> TableKind {
        self.table
    }

    /// Value stored under the column, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Value stored under the column, reporting a [`LookupError`] when absent.
    pub fn require(&self, column: &str) -> Result<&str, LookupError> {
        self.get(column).ok_or_else(|| LookupError::MissingColumn {
            table: self.table,
            column: column.to_owned(),
        })
    }
}

/// Load-once repository of the five reference tables.
#[derive(Clone, Debug, Default)]
pub struct ReferenceData {
    tables: Option<BTreeMap<TableKind, Vec<Row>>>,
}

impl ReferenceData {
    /// Creates a repository in the not-loaded state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loaded repository from in-memory tables.
    ///
    /// Tables missing from the iterator are treated as empty.
    #[must_use]
    pub fn from_tables(tables: impl IntoIterator<Item = (TableKind, Vec<Row>)>) -> Self {
        let mut loaded: BTreeMap<TableKind, Vec<Row>> =
            TableKind::ALL.iter().map(|kind| (*kind, Vec::new())).collect();
        for (kind, rows) in tables {
            let _ = loaded.insert(kind, rows);
        }
        Self {
            tables: Some(loaded),
        }
    }

    /// Loads every table from `<dir>/<table file name>`.
    ///
    /// A missing file leaves its table empty so that runs which never touch it
    /// still succeed; queries against it report [`ConfigurationError::EmptyTable`].
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut tables = Vec::with_capacity(TableKind::ALL.len());
        for kind in TableKind::ALL {
            let path = dir.join(kind.file_name());
            if !path.is_file() {
                warn!(table = %kind, path = %path.display(), "reference table file missing");
                tables.push((kind, Vec::new()));
                continue;
            }

            let file = File::open(&path)
                .with_context(|| format!("failed to open reference table {}", path.display()))?;
            let rows = parse_table(kind, file)
                .with_context(|| format!("failed to load reference table {}", path.display()))?;
            if rows.is_empty() {
                warn!(table = %kind, path = %path.display(), "reference table contains no rows");
            } else {
                debug!(table = %kind, rows = rows.len(), "loaded reference table");
            }
            tables.push((kind, rows));
        }
        Ok(Self::from_tables(tables))
    }

    /// Reports whether the repository left the not-loaded state.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.tables.is_some()
    }
}

/// Parses a CSV table whose first line carries the column names.
pub fn parse_table(kind: TableKind, reader: impl Read) -> Result<Vec<Row>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .with_context(|| format!("failed to read {kind} header"))?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse {kind} row {}", index + 1))?;
        rows.push(Row::new(kind, headers.iter().zip(record.iter())));
    }
    Ok(rows)
}

/// Query functions that provide read-only access to the reference data.
pub mod query {
    use rand::{seq::SliceRandom, Rng};
    use samgen_core::{Category, ConfigurationError, LookupError, TableKind};

    use super::{columns, ReferenceData, Row};

    /// Rows of the table, failing when the repository is not loaded or the table is empty.
    pub fn table(data: &ReferenceData, kind: TableKind) -> Result<&[Row], ConfigurationError> {
        let tables = data
            .tables
            .as_ref()
            .ok_or(ConfigurationError::ReferenceNotLoaded)?;
        match tables.get(&kind) {
            Some(rows) if !rows.is_empty() => Ok(rows),
            _ => Err(ConfigurationError::EmptyTable { table: kind }),
        }
    }

    /// Picks a row uniformly at random.
    pub fn choose<'a, R: Rng + ?Sized>(
        data: &'a ReferenceData,
        kind: TableKind,
        rng: &mut R,
    ) -> Result<&'a Row, ConfigurationError> {
        let rows = table(data, kind)?;
        rows.choose(rng)
            .ok_or(ConfigurationError::EmptyTable { table: kind })
    }

    /// First row whose column equals the value exactly.
    pub fn find<'a>(
        data: &'a ReferenceData,
        kind: TableKind,
        column: &str,
        value: &str,
    ) -> Result<Option<&'a Row>, ConfigurationError> {
        Ok(table(data, kind)?
            .iter()
            .find(|row| row.get(column) == Some(value)))
    }

    /// Discovery model whose normalized product matches the category.
    ///
    /// The outer error fails the caller; the inner one marks a category that
    /// can be skipped.
    pub fn discovery_for<'a>(
        data: &'a ReferenceData,
        category: &Category,
    ) -> Result<Result<&'a Row, LookupError>, ConfigurationError> {
        let found = find(
            data,
            TableKind::Discovery,
            columns::NORM_PRODUCT,
            category.as_str(),
        )?;
        Ok(found.ok_or_else(|| LookupError::MissingCategory {
            category: category.clone(),
        }))
    }

    /// First `count` discovery models in table order.
    pub fn leading_discovery(
        data: &ReferenceData,
        count: usize,
    ) -> Result<&[Row], ConfigurationError> {
        let rows = table(data, TableKind::Discovery)?;
        Ok(&rows[..count.min(rows.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use samgen_core::Category;

    const DISCOVERY_CSV: &str = "\
discovery_model,discovery_sys_id,norm_product,version
Model A, d-1 ,AutoCAD Architecture,2020.0
Model B,d-2,ArcGIS 3D Analyst,10.8
";

    #[test]
    fn parse_table_trims_and_maps_headers() {
        let rows = parse_table(TableKind::Discovery, DISCOVERY_CSV.as_bytes()).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(columns::DISCOVERY_SYS_ID), Some("d-1"));
        assert_eq!(rows[1].get(columns::NORM_PRODUCT), Some("ArcGIS 3D Analyst"));
        assert_eq!(rows[0].table(), TableKind::Discovery);
    }

    #[test]
    fn not_loaded_repository_reports_configuration_error() {
        let data = ReferenceData::new();
        assert!(!data.is_loaded());
        assert_eq!(
            query::table(&data, TableKind::User),
            Err(ConfigurationError::ReferenceNotLoaded)
        );
    }

    #[test]
    fn empty_table_reports_configuration_error() {
        let rows = parse_table(TableKind::Discovery, DISCOVERY_CSV.as_bytes()).expect("parse");
        let data = ReferenceData::from_tables([(TableKind::Discovery, rows)]);
        assert!(data.is_loaded());
        assert_eq!(
            query::table(&data, TableKind::Group),
            Err(ConfigurationError::EmptyTable {
                table: TableKind::Group
            })
        );
    }

    #[test]
    fn require_reports_missing_column() {
        let row = Row::new(TableKind::Group, [("group", "Engineering")]);
        assert_eq!(
            row.require(columns::GROUP_SYS_ID),
            Err(LookupError::MissingColumn {
                table: TableKind::Group,
                column: columns::GROUP_SYS_ID.to_owned(),
            })
        );
    }

    #[test]
    fn discovery_lookup_matches_exactly() {
        let data = fixtures::reference_data();
        let row = query::discovery_for(&data, &Category::new("ArcGIS 3D Analyst"))
            .expect("loaded")
            .expect("row");
        assert_eq!(row.get(columns::NORM_PRODUCT), Some("ArcGIS 3D Analyst"));

        let missing = query::discovery_for(&data, &Category::new("arcgis 3d analyst"));
        assert!(matches!(
            missing,
            Ok(Err(LookupError::MissingCategory { .. }))
        ));

        assert_eq!(
            query::discovery_for(&ReferenceData::new(), &Category::new("ArcGIS 3D Analyst")),
            Err(ConfigurationError::ReferenceNotLoaded)
        );
    }

    #[test]
    fn choose_is_reproducible_for_a_seed() {
        let data = fixtures::reference_data();
        let pick = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..8)
                .map(|_| {
                    query::choose(&data, TableKind::User, &mut rng)
                        .expect("user")
                        .get(columns::USER)
                        .map(str::to_owned)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(11), pick(11));
    }

    #[test]
    fn leading_discovery_caps_at_table_length() {
        let data = fixtures::reference_data();
        assert_eq!(query::leading_discovery(&data, 2).expect("rows").len(), 2);
        assert_eq!(query::leading_discovery(&data, 99).expect("rows").len(), 3);
    }
}
